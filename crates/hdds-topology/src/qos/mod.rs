// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS policy bag attached to discovered endpoints, and the
//! request-vs-offered compatibility rules evaluated between them.

mod compat;
mod policy;

pub use compat::{check_compatibility, is_compatible};
pub use policy::{
    DataRepresentation, DataRepresentationId, Deadline, DestinationOrder, Durability, History,
    LatencyBudget, Liveliness, LivelinessKind, Ownership, Partition, Presentation,
    PresentationAccessScope, Reliability, DURATION_INFINITE,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request/offered policies announced for one reader or writer.
///
/// Defaults are the DDS defaults for a DataReader/DataWriter except
/// reliability, which callers set explicitly (writers default to RELIABLE
/// in DDS, readers to BEST_EFFORT).
///
/// # Example
///
/// ```
/// use hdds_topology::qos::EndpointQos;
///
/// let writer = EndpointQos::reliable().transient_local().keep_last(10);
/// let reader = EndpointQos::best_effort();
/// assert!(hdds_topology::qos::check_compatibility(&reader, &writer).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointQos {
    pub durability: Durability,
    pub presentation: Presentation,
    pub deadline: Deadline,
    pub latency_budget: LatencyBudget,
    pub ownership: Ownership,
    pub liveliness: Liveliness,
    pub partition: Partition,
    pub reliability: Reliability,
    pub destination_order: DestinationOrder,
    pub history: History,
    pub data_representation: DataRepresentation,
}

impl EndpointQos {
    pub fn best_effort() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            ..Self::default()
        }
    }

    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::default()
        }
    }

    pub fn durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn transient_local(self) -> Self {
        self.durability(Durability::TransientLocal)
    }

    pub fn keep_last(mut self, depth: u32) -> Self {
        self.history = History::KeepLast(depth);
        self
    }

    pub fn keep_all(mut self) -> Self {
        self.history = History::KeepAll;
        self
    }

    pub fn deadline_millis(mut self, ms: u64) -> Self {
        self.deadline = Deadline::from_millis(ms);
        self
    }

    pub fn latency_budget_millis(mut self, ms: u64) -> Self {
        self.latency_budget = LatencyBudget::from_millis(ms);
        self
    }

    pub fn ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn liveliness(mut self, liveliness: Liveliness) -> Self {
        self.liveliness = liveliness;
        self
    }

    pub fn partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub fn presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn destination_order(mut self, order: DestinationOrder) -> Self {
        self.destination_order = order;
        self
    }

    pub fn data_representation(mut self, ids: Vec<DataRepresentationId>) -> Self {
        self.data_representation = DataRepresentation::new(ids);
        self
    }
}

/// Policy kinds that take part in request-vs-offered matching.
///
/// Declaration order is the checking order, which follows the DDS
/// QoS policy ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyKind {
    Durability,
    Presentation,
    Deadline,
    LatencyBudget,
    Ownership,
    Liveliness,
    Partition,
    Reliability,
    DestinationOrder,
    History,
    DataRepresentation,
}

impl PolicyKind {
    /// DDS QosPolicyId_t value.
    pub fn id(self) -> u32 {
        match self {
            PolicyKind::Durability => 2,
            PolicyKind::Presentation => 3,
            PolicyKind::Deadline => 4,
            PolicyKind::LatencyBudget => 5,
            PolicyKind::Ownership => 6,
            PolicyKind::Liveliness => 8,
            PolicyKind::Partition => 10,
            PolicyKind::Reliability => 11,
            PolicyKind::DestinationOrder => 12,
            PolicyKind::History => 13,
            PolicyKind::DataRepresentation => 23,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Durability => "DURABILITY",
            PolicyKind::Presentation => "PRESENTATION",
            PolicyKind::Deadline => "DEADLINE",
            PolicyKind::LatencyBudget => "LATENCY_BUDGET",
            PolicyKind::Ownership => "OWNERSHIP",
            PolicyKind::Liveliness => "LIVELINESS",
            PolicyKind::Partition => "PARTITION",
            PolicyKind::Reliability => "RELIABILITY",
            PolicyKind::DestinationOrder => "DESTINATION_ORDER",
            PolicyKind::History => "HISTORY",
            PolicyKind::DataRepresentation => "DATA_REPRESENTATION",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
