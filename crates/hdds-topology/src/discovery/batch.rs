// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::guid::Guid;
use crate::model::{DomainId, Endpoint, Participant, ParticipantMetadata};

/// Typed discovery change produced by an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    NewParticipant(Participant),
    RemoveParticipant(Guid),
    UpdateParticipant {
        key: Guid,
        metadata: ParticipantMetadata,
    },
    NewEndpoint(Endpoint),
    RemoveEndpoint(Guid),
}

/// Everything one observer wake cycle classified, applied as one unit.
///
/// Events are ordered participants first, then participant-status
/// updates, then publications and subscriptions.
///
/// `generation` identifies which incarnation of the domain produced the
/// batch: it counts how many times the domain id was added to the table
/// before, starting at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryBatch {
    pub domain_id: DomainId,
    pub generation: u64,
    pub events: Vec<DiscoveryEvent>,
}

impl DiscoveryBatch {
    pub fn new(domain_id: DomainId, generation: u64) -> Self {
        Self {
            domain_id,
            generation,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: DiscoveryEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
