// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned engine instance: domain table, shared queue and dispatcher thread.

use crate::config::TopologyConfig;
use crate::discovery::DiscoveryBackend;
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::error::Result;
use crate::events::{TopologyEvent, TopologyListener};
use crate::model::DomainId;
use crate::table::DomainTable;
use crossbeam::channel::{self, Receiver};
use std::sync::Arc;

/// Running topology monitor.
///
/// # Example
///
/// ```no_run
/// use hdds_topology::{LoopbackDiscovery, TopologyConfig, TopologyMonitor};
/// use std::sync::Arc;
///
/// let config = TopologyConfig::builder().domain(0).build();
/// let mut monitor = TopologyMonitor::start(config, Arc::new(LoopbackDiscovery::new()))?;
/// println!("topics: {:?}", monitor.table().topics(0));
/// monitor.shutdown();
/// # Ok::<(), hdds_topology::TopologyError>(())
/// ```
pub struct TopologyMonitor {
    table: Arc<DomainTable>,
    dispatcher: Option<DispatcherHandle>,
    config: TopologyConfig,
}

impl TopologyMonitor {
    /// Validate `config`, spawn the dispatcher and add the configured domains.
    pub fn start(config: TopologyConfig, backend: Arc<dyn DiscoveryBackend>) -> Result<Self> {
        Self::start_with_listener(config, backend, None)
    }

    /// Like [`start`](Self::start), with a listener registered before the
    /// first domain is added so it sees every notification.
    pub fn start_with_listener(
        config: TopologyConfig,
        backend: Arc<dyn DiscoveryBackend>,
        listener: Option<Arc<dyn TopologyListener>>,
    ) -> Result<Self> {
        config.validate()?;

        let (queue_tx, queue_rx) = channel::unbounded();
        let table = Arc::new(DomainTable::new(
            backend,
            queue_tx,
            config.observer.clone(),
        ));
        if let Some(listener) = listener {
            table.add_listener(listener);
        }

        let dispatcher = Dispatcher::new(Arc::clone(&table), queue_rx, config.dispatcher.clone())
            .spawn()?;

        let monitor = Self {
            table,
            dispatcher: Some(dispatcher),
            config,
        };
        for domain_id in monitor.config.domains.clone() {
            monitor.add_domain(domain_id)?;
        }

        tracing::info!(
            "[table] topology monitor started ({} domains)",
            monitor.config.domains.len()
        );
        Ok(monitor)
    }

    pub fn table(&self) -> &Arc<DomainTable> {
        &self.table
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn add_domain(&self, domain_id: DomainId) -> Result<bool> {
        self.table.add_domain(domain_id)
    }

    pub fn remove_domain(&self, domain_id: DomainId) -> bool {
        self.table.remove_domain(domain_id)
    }

    pub fn subscribe(&self) -> Receiver<TopologyEvent> {
        self.table.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.as_ref().is_some_and(DispatcherHandle::is_running)
    }

    /// Stop and join every observer, clear the table, then stop the
    /// dispatcher. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let Some(mut dispatcher) = self.dispatcher.take() else {
            return;
        };
        self.table.shutdown();
        dispatcher.shutdown();
        tracing::info!("[table] topology monitor stopped");
    }
}

impl Drop for TopologyMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::discovery::LoopbackDiscovery;
    use crate::error::TopologyError;
    use std::time::Duration;

    #[test]
    fn test_start_adds_configured_domains() {
        let config = TopologyConfig::builder()
            .domain(0)
            .domain(2)
            .idle_interval(Duration::from_millis(10))
            .build();
        let backend = LoopbackDiscovery::new();
        let mut monitor = TopologyMonitor::start(config, Arc::new(backend.clone())).expect("start");

        assert_eq!(monitor.table().domains(), vec![0, 2]);
        assert!(monitor.is_running());

        monitor.shutdown();
        assert!(monitor.table().domains().is_empty());
        assert!(!monitor.is_running());
        assert_eq!(backend.open_sessions(0), 0);
        monitor.shutdown();
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let mut config = TopologyConfig::default();
        config.dispatcher.idle_interval_ms = 0;
        let result = TopologyMonitor::start(config, Arc::new(LoopbackDiscovery::new()));
        assert!(matches!(
            result,
            Err(TopologyError::Config(ConfigError::Invalid(_)))
        ));
    }
}
