// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.

use crate::config::ConfigError;
use crate::model::DomainId;
use thiserror::Error;

/// Errors surfaced by the topology engine.
///
/// Unknown-key operations are not errors; they are silent no-ops.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The middleware could not serve discovery for a domain.
    #[error("Discovery error on domain {domain_id}: {message}")]
    Discovery { domain_id: DomainId, message: String },

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture line {line}: {message}")]
    Capture { line: usize, message: String },
}

impl TopologyError {
    pub fn discovery(domain_id: DomainId, message: impl Into<String>) -> Self {
        Self::Discovery {
            domain_id,
            message: message.into(),
        }
    }
}

/// Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;
