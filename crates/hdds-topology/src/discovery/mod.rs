// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery input: the middleware seam and the per-domain observer.
//!
//! # Architecture
//!
//! ```text
//! DiscoveryBackend::open(domain) -> DiscoverySession
//!        |
//!        v
//! DiscoveryObserver (one thread per domain)
//!   wait() -> take_*() -> classify -> DiscoveryBatch
//!        |
//!        v
//! shared queue (crossbeam unbounded) -> Dispatcher
//! ```
//!
//! The middleware exposes its built-in discovery readers through
//! [`DiscoverySession`]; samples carry DDS sample/instance states which the
//! observer turns into typed [`DiscoveryEvent`]s.

mod batch;
pub mod capture;
mod guard;
mod loopback;
mod observer;

pub use batch::{DiscoveryBatch, DiscoveryEvent};
pub use guard::{GuardCondition, WakeSignal};
pub use loopback::LoopbackDiscovery;
pub use observer::DiscoveryObserver;

use crate::error::Result;
use crate::guid::Guid;
use crate::model::{DomainId, ParticipantMetadata};
use crate::qos::EndpointQos;
use std::time::Duration;

/// DDS sample state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleState {
    #[default]
    NotRead,
    Read,
}

/// DDS instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState {
    #[default]
    Alive,
    NotAliveDisposed,
    NotAliveNoWriters,
}

/// Per-sample metadata delivered with built-in topic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleInfo {
    pub sample_state: SampleState,
    pub instance_state: InstanceState,
}

impl SampleInfo {
    /// Fresh, unread sample of a live instance.
    pub fn alive() -> Self {
        Self::default()
    }

    pub fn disposed() -> Self {
        Self {
            sample_state: SampleState::NotRead,
            instance_state: InstanceState::NotAliveDisposed,
        }
    }
}

/// One taken sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub info: SampleInfo,
    pub data: T,
}

impl<T> Sample<T> {
    pub fn alive(data: T) -> Self {
        Self {
            info: SampleInfo::alive(),
            data,
        }
    }

    pub fn disposed(data: T) -> Self {
        Self {
            info: SampleInfo::disposed(),
            data,
        }
    }
}

/// DCPSParticipant sample payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantData {
    pub key: Guid,
}

/// DCPSPublication / DCPSSubscription sample payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointData {
    pub key: Guid,
    pub participant_key: Guid,
    pub topic_name: String,
    pub type_name: String,
    pub qos: EndpointQos,
}

impl EndpointData {
    pub fn new(key: Guid, topic_name: &str, type_name: &str, qos: EndpointQos) -> Self {
        Self {
            key,
            participant_key: key.participant(),
            topic_name: topic_name.to_string(),
            type_name: type_name.to_string(),
            qos,
        }
    }
}

/// Vendor participant-status sample payload (process/host information).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantStatusData {
    pub key: Guid,
    pub metadata: ParticipantMetadata,
}

/// A sample from any of the built-in readers.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinSample {
    Participant(Sample<ParticipantData>),
    Publication(Sample<EndpointData>),
    Subscription(Sample<EndpointData>),
    ParticipantStatus(Sample<ParticipantStatusData>),
}

/// Built-in discovery readers of one domain, plus a wait over all of them.
///
/// A session lives on its observer thread and is never shared.
pub trait DiscoverySession {
    /// Block until at least one reader has data or the guard condition is
    /// triggered. `None` waits without limit.
    ///
    /// Returns the number of triggered conditions (0 on timeout).
    fn wait(&mut self, timeout: Option<Duration>) -> Result<usize>;

    fn take_participants(&mut self) -> Vec<Sample<ParticipantData>>;

    fn take_publications(&mut self) -> Vec<Sample<EndpointData>>;

    fn take_subscriptions(&mut self) -> Vec<Sample<EndpointData>>;

    /// Vendor participant-status topic; middleware without one has nothing.
    fn take_participant_status(&mut self) -> Vec<Sample<ParticipantStatusData>> {
        Vec::new()
    }
}

/// Factory of discovery sessions (the middleware collaborator).
pub trait DiscoveryBackend: Send + Sync {
    /// Open the built-in readers of `domain_id`. The session must return
    /// from `wait` when `guard` is triggered.
    fn open(&self, domain_id: DomainId, guard: GuardCondition)
        -> Result<Box<dyn DiscoverySession>>;
}
