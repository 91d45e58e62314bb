// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Topology Monitor
//!
//! Maintains a live model of a DDS domain's topology from built-in
//! discovery data: participants, readers and writers per topic, and every
//! reader/writer pair whose QoS policies are incompatible.
//!
//! # Features
//!
//! - **Incremental QoS matching** -- RxO rules re-checked only against the
//!   opposite-direction peers of a changed endpoint
//! - **Per-domain observers** -- one thread per domain drains the built-in
//!   readers and batches discovery changes
//! - **Single dispatcher** -- applies batches under one reentrant lock with
//!   a bounded drain cycle
//! - **Notifications** -- listener callbacks or crossbeam channels
//!
//! # Architecture
//!
//! ```text
//! DiscoveryObserver (per domain) --batch--> queue --> Dispatcher
//!                                                        |
//!                                              DomainTable (lock)
//!                                              +-- DomainRegistry
//!                                                  +-- EndpointRegistry (per topic)
//!                                                        |
//!                                               TopologyEvent -> listeners
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hdds_topology::discovery::EndpointData;
//! use hdds_topology::qos::EndpointQos;
//! use hdds_topology::{Guid, LoopbackDiscovery, TopologyConfig, TopologyMonitor};
//! use std::sync::Arc;
//!
//! let backend = LoopbackDiscovery::new();
//! let config = TopologyConfig::builder().domain(0).build();
//! let monitor = TopologyMonitor::start(config, Arc::new(backend.clone()))?;
//! let events = monitor.subscribe();
//!
//! let writer = Guid::new([1; 12], [0, 0, 1, 0x02]);
//! backend.announce_writer(0, EndpointData::new(writer, "Square", "ShapeType", EndpointQos::reliable()));
//!
//! for event in events.iter() {
//!     println!("{:?}", event);
//! }
//! # Ok::<(), hdds_topology::TopologyError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod guid;
pub mod model;
pub mod monitor;
pub mod qos;
pub mod registry;
pub mod table;

pub use config::{ConfigError, TopologyConfig};
pub use discovery::{DiscoveryBackend, DiscoverySession, LoopbackDiscovery};
pub use dispatcher::{Dispatcher, DispatcherHandle, DrainStats};
pub use error::{Result, TopologyError};
pub use events::{Notifier, TopologyEvent, TopologyListener};
pub use guid::Guid;
pub use model::{Direction, DomainId, Endpoint, Participant, ParticipantMetadata};
pub use monitor::TopologyMonitor;
pub use registry::{DomainRegistry, DomainSnapshot, EndpointRegistry};
pub use table::DomainTable;
