// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topology monitor configuration.
//!
//! Supports both programmatic (builder) and file-based (TOML) configuration.
//!
//! ```toml
//! domains = [0, 1]
//!
//! [dispatcher]
//! yield_budget_ms = 2000
//! idle_interval_ms = 1000
//!
//! [observer]
//! wait_timeout_ms = 500
//! ignored_topics = ["DCPSParticipant", "DCPSPublication"]
//! ```

use crate::model::DomainId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Middleware bookkeeping topics that never surface as user endpoints.
pub const DEFAULT_IGNORED_TOPICS: [&str; 13] = [
    "DCPSParticipant",
    "DCPSPublication",
    "DCPSSubscription",
    "CMParticipant",
    "CMDataReader",
    "CMDataWriter",
    "CMSubscriber",
    "CMPublisher",
    "DCPSTopic",
    "DCPSType",
    "DCPSHeartbeat",
    "DCPSCandMCommand",
    "DCPSDelivery",
];

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Domains observed from start-up.
    #[serde(default)]
    pub domains: Vec<DomainId>,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub observer: ObserverConfig,
}

/// Event dispatcher timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// A drain cycle stops pulling batches once this much time has elapsed.
    #[serde(default = "default_yield_budget_ms")]
    pub yield_budget_ms: u64,

    /// Sleep between two drain cycles.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

fn default_yield_budget_ms() -> u64 {
    2000
}

fn default_idle_interval_ms() -> u64 {
    1000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            yield_budget_ms: default_yield_budget_ms(),
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

impl DispatcherConfig {
    pub fn yield_budget(&self) -> Duration {
        Duration::from_millis(self.yield_budget_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

/// Discovery observer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Wait timeout; absent means wait until something triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_timeout_ms: Option<u64>,

    #[serde(default = "default_ignored_topics")]
    pub ignored_topics: Vec<String>,
}

fn default_ignored_topics() -> Vec<String> {
    DEFAULT_IGNORED_TOPICS.iter().map(|s| s.to_string()).collect()
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: None,
            ignored_topics: default_ignored_topics(),
        }
    }
}

impl ObserverConfig {
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn is_ignored(&self, topic_name: &str) -> bool {
        self.ignored_topics.iter().any(|t| t == topic_name)
    }
}

impl TopologyConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a new config builder
    pub fn builder() -> TopologyConfigBuilder {
        TopologyConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatcher.idle_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "dispatcher.idle_interval_ms must be greater than 0".into(),
            ));
        }

        if let Some(i) = self.observer.ignored_topics.iter().position(String::is_empty) {
            return Err(ConfigError::Invalid(format!(
                "observer.ignored_topics[{}] is empty",
                i
            )));
        }

        Ok(())
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct TopologyConfigBuilder {
    domains: Vec<DomainId>,
    yield_budget_ms: Option<u64>,
    idle_interval_ms: Option<u64>,
    wait_timeout_ms: Option<u64>,
    ignored_topics: Option<Vec<String>>,
}

impl TopologyConfigBuilder {
    /// Observe this domain from start-up
    pub fn domain(mut self, domain_id: DomainId) -> Self {
        if !self.domains.contains(&domain_id) {
            self.domains.push(domain_id);
        }
        self
    }

    pub fn yield_budget(mut self, budget: Duration) -> Self {
        self.yield_budget_ms = Some(u64::try_from(budget.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Replace the ignored topic list
    pub fn ignored_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_topics = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration
    pub fn build(self) -> TopologyConfig {
        let defaults = TopologyConfig::default();

        TopologyConfig {
            domains: self.domains,
            dispatcher: DispatcherConfig {
                yield_budget_ms: self
                    .yield_budget_ms
                    .unwrap_or(defaults.dispatcher.yield_budget_ms),
                idle_interval_ms: self
                    .idle_interval_ms
                    .unwrap_or(defaults.dispatcher.idle_interval_ms),
            },
            observer: ObserverConfig {
                wait_timeout_ms: self.wait_timeout_ms.or(defaults.observer.wait_timeout_ms),
                ignored_topics: self
                    .ignored_topics
                    .unwrap_or(defaults.observer.ignored_topics),
            },
        }
    }
}
