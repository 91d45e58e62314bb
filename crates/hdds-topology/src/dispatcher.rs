// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event dispatcher: the single consumer of the observer queue.
//!
//! A drain cycle pulls batches one at a time and applies each one whole.
//! Once the cycle has run longer than the yield budget it stops after the
//! batch in progress, never in the middle of one. Between cycles the
//! dispatcher sleeps for the idle interval, so bursts of discovery traffic
//! are coalesced rather than propagated per event.

use crate::config::DispatcherConfig;
use crate::discovery::DiscoveryBatch;
use crate::error::{Result, TopologyError};
use crate::table::DomainTable;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Batches applied.
    pub batches: usize,
    /// Discovery events applied across those batches.
    pub events: usize,
    /// The cycle stopped on the time budget rather than on an empty queue.
    pub yielded: bool,
}

pub struct Dispatcher {
    table: Arc<DomainTable>,
    queue: Receiver<DiscoveryBatch>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        table: Arc<DomainTable>,
        queue: Receiver<DiscoveryBatch>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            table,
            queue,
            config,
        }
    }

    /// Run one drain cycle on the calling thread.
    pub fn drain_cycle(&self) -> DrainStats {
        let started = Instant::now();
        let budget = self.config.yield_budget();
        let mut stats = DrainStats::default();

        while let Ok(batch) = self.queue.try_recv() {
            stats.batches += 1;
            stats.events += batch.len();
            self.table.apply(batch);

            if started.elapsed() >= budget {
                stats.yielded = true;
                break;
            }
        }

        if stats.batches > 0 {
            tracing::debug!(
                "[dispatcher] drained {} batches ({} events) in {:?}{}",
                stats.batches,
                stats.events,
                started.elapsed(),
                if stats.yielded { ", yielding" } else { "" }
            );
        }
        stats
    }

    /// Batches waiting in the queue.
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }

    /// Move the dispatcher onto its own thread.
    pub fn spawn(self) -> Result<DispatcherHandle> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
        let name = "hdds-topology-dispatcher".to_string();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run(shutdown_rx))
            .map_err(|source| TopologyError::Spawn { name, source })?;

        Ok(DispatcherHandle {
            shutdown_tx,
            thread: Some(thread),
        })
    }

    fn run(self, shutdown_rx: Receiver<()>) {
        tracing::info!("[dispatcher] started");
        let idle = self.config.idle_interval();
        loop {
            match shutdown_rx.recv_timeout(idle) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            self.drain_cycle();
        }
        tracing::info!("[dispatcher] stopped");
    }
}

/// Running dispatcher thread. Dropping it stops and joins the thread.
pub struct DispatcherHandle {
    shutdown_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Stop the thread, interrupting its idle sleep, and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("[dispatcher] thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
