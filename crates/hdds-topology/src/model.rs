// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topology entities: participants and endpoints.
//!
//! Every value here is plain owned data; cloning one yields an
//! independent snapshot that shares nothing with the registry.

use crate::guid::Guid;
use crate::qos::{EndpointQos, PolicyKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// DDS domain identifier.
pub type DomainId = u32;

/// Out-of-band participant information (vendor participant-status topic).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantMetadata {
    pub process_name: Option<String>,
    pub hostname: Option<String>,
    pub process_id: Option<u32>,
}

impl ParticipantMetadata {
    pub fn is_empty(&self) -> bool {
        self.process_name.is_none() && self.hostname.is_none() && self.process_id.is_none()
    }
}

/// One middleware process presence in a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub key: Guid,
    #[serde(default, skip_serializing_if = "ParticipantMetadata::is_empty")]
    pub metadata: ParticipantMetadata,
}

impl Participant {
    pub fn new(key: Guid) -> Self {
        Self {
            key,
            metadata: ParticipantMetadata::default(),
        }
    }

    pub fn with_metadata(key: Guid, metadata: ParticipantMetadata) -> Self {
        Self { key, metadata }
    }

    /// Human-readable label: process name when known, else the key.
    pub fn label(&self) -> String {
        match (&self.metadata.process_name, &self.metadata.hostname) {
            (Some(name), Some(host)) => format!("{}@{}", name, host),
            (Some(name), None) => name.clone(),
            _ => self.key.to_string(),
        }
    }
}

/// Endpoint role on its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Reader,
    Writer,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Reader => Direction::Writer,
            Direction::Writer => Direction::Reader,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Reader => f.write_str("reader"),
            Direction::Writer => f.write_str("writer"),
        }
    }
}

/// A reader or writer bound to one topic and one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub key: Guid,
    pub direction: Direction,
    pub topic_name: String,
    pub type_name: String,
    pub participant_key: Guid,
    /// Owning participant once it has been discovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Participant>,
    #[serde(default)]
    pub qos: EndpointQos,
    /// Peer endpoint key -> incompatible policies. Only non-empty lists are stored.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mismatches: BTreeMap<Guid, Vec<PolicyKind>>,
}

impl Endpoint {
    pub fn new(
        key: Guid,
        direction: Direction,
        topic_name: impl Into<String>,
        type_name: impl Into<String>,
        participant_key: Guid,
        qos: EndpointQos,
    ) -> Self {
        Self {
            key,
            direction,
            topic_name: topic_name.into(),
            type_name: type_name.into(),
            participant_key,
            participant: None,
            qos,
            mismatches: BTreeMap::new(),
        }
    }

    pub fn reader(key: Guid, topic_name: &str, type_name: &str, qos: EndpointQos) -> Self {
        Self::new(key, Direction::Reader, topic_name, type_name, key.participant(), qos)
    }

    pub fn writer(key: Guid, topic_name: &str, type_name: &str, qos: EndpointQos) -> Self {
        Self::new(key, Direction::Writer, topic_name, type_name, key.participant(), qos)
    }

    pub fn is_reader(&self) -> bool {
        self.direction == Direction::Reader
    }

    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid(n: u8, entity: u8) -> Guid {
        Guid::new([n; 12], [0, 0, entity, 0x04])
    }

    #[test]
    fn test_endpoint_owner_defaults_to_prefix_participant() {
        let reader = Endpoint::reader(guid(3, 1), "Square", "ShapeType", EndpointQos::default());
        assert_eq!(reader.participant_key, guid(3, 1).participant());
        assert!(reader.participant.is_none());
        assert!(reader.is_reader());
        assert!(!reader.has_mismatches());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut original =
            Endpoint::writer(guid(1, 2), "Square", "ShapeType", EndpointQos::reliable());
        let snapshot = original.clone();
        original
            .mismatches
            .insert(guid(2, 1), vec![PolicyKind::Reliability]);
        assert!(snapshot.mismatches.is_empty());
    }

    #[test]
    fn test_participant_label() {
        let key = guid(9, 0);
        assert_eq!(Participant::new(key).label(), key.to_string());
        let named = Participant::with_metadata(
            key,
            ParticipantMetadata {
                process_name: Some("sensor_node".into()),
                hostname: Some("rpi4".into()),
                process_id: Some(42),
            },
        );
        assert_eq!(named.label(), "sensor_node@rpi4");
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Reader.opposite(), Direction::Writer);
        assert_eq!(Direction::Writer.opposite(), Direction::Reader);
    }
}
