// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-topic endpoint registry with incremental mismatch bookkeeping.
//!
//! Adding an endpoint checks it against every endpoint of the opposite
//! direction (O(peers)); the resulting mismatch list is stored on both
//! sides. Compatible pairs store nothing, so the mismatch map of an
//! endpoint only ever names incompatible peers.

use crate::guid::Guid;
use crate::model::{Direction, Endpoint};
use crate::qos::{check_compatibility, PolicyKind};
use std::collections::{BTreeMap, HashSet};

/// Readers and writers bound to one topic name.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    readers: BTreeMap<Guid, Endpoint>,
    writers: BTreeMap<Guid, Endpoint>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&self, direction: Direction) -> &BTreeMap<Guid, Endpoint> {
        match direction {
            Direction::Reader => &self.readers,
            Direction::Writer => &self.writers,
        }
    }

    fn side_mut(&mut self, direction: Direction) -> &mut BTreeMap<Guid, Endpoint> {
        match direction {
            Direction::Reader => &mut self.readers,
            Direction::Writer => &mut self.writers,
        }
    }

    pub fn contains(&self, key: &Guid) -> bool {
        self.readers.contains_key(key) || self.writers.contains_key(key)
    }

    /// Insert an endpoint and compute its mismatches against every peer of
    /// the opposite direction.
    ///
    /// Returns `false` (and changes nothing) when the key is already known.
    pub fn add_endpoint(&mut self, mut endpoint: Endpoint) -> bool {
        if self.contains(&endpoint.key) {
            return false;
        }

        endpoint.mismatches.clear();
        let direction = endpoint.direction;

        for peer in self.side_mut(direction.opposite()).values_mut() {
            let policies = match direction {
                Direction::Reader => check_compatibility(&endpoint.qos, &peer.qos),
                Direction::Writer => check_compatibility(&peer.qos, &endpoint.qos),
            };
            if policies.is_empty() {
                continue;
            }

            tracing::debug!(
                "[registry] QoS mismatch on '{}': {} {} <-> {} {}: {:?}",
                endpoint.topic_name,
                direction,
                endpoint.key,
                peer.direction,
                peer.key,
                policies
            );
            peer.mismatches.insert(endpoint.key, policies.clone());
            endpoint.mismatches.insert(peer.key, policies);
        }

        self.side_mut(direction).insert(endpoint.key, endpoint);
        true
    }

    /// Remove an endpoint and every reciprocal mismatch entry naming it.
    pub fn remove_endpoint(&mut self, key: &Guid) -> Option<Endpoint> {
        let removed = self
            .readers
            .remove(key)
            .or_else(|| self.writers.remove(key))?;

        let peers = self.side_mut(removed.direction.opposite());
        for peer_key in removed.mismatches.keys() {
            if let Some(peer) = peers.get_mut(peer_key) {
                peer.mismatches.remove(key);
            }
        }

        Some(removed)
    }

    /// At least one endpoint (reader or writer) is registered.
    pub fn has_endpoints(&self) -> bool {
        !self.readers.is_empty() || !self.writers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readers.len() + self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_endpoints()
    }

    /// De-duplicated keys named in any mismatch map, readers scanned before
    /// writers, first occurrence kept.
    pub fn mismatched_peer_keys(&self) -> Vec<Guid> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for endpoint in self.readers.values().chain(self.writers.values()) {
            for peer in endpoint.mismatches.keys() {
                if seen.insert(*peer) {
                    keys.push(*peer);
                }
            }
        }
        keys
    }

    /// Incompatible policy pairs as (reader, writer, policies).
    pub fn mismatched_pairs(&self) -> Vec<(Guid, Guid, Vec<PolicyKind>)> {
        self.readers
            .values()
            .flat_map(|reader| {
                reader
                    .mismatches
                    .iter()
                    .map(move |(writer, policies)| (reader.key, *writer, policies.clone()))
            })
            .collect()
    }

    pub fn get(&self, key: &Guid) -> Option<&Endpoint> {
        self.readers.get(key).or_else(|| self.writers.get(key))
    }

    pub fn endpoints(&self, direction: Direction) -> &BTreeMap<Guid, Endpoint> {
        self.side(direction)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.readers.values().chain(self.writers.values())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Endpoint> {
        self.readers.values_mut().chain(self.writers.values_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::EndpointQos;

    fn key(n: u8) -> Guid {
        Guid::new([n; 12], [0, 0, 0, n])
    }

    fn reader(n: u8, qos: EndpointQos) -> Endpoint {
        Endpoint::reader(key(n), "T", "Type", qos)
    }

    fn writer(n: u8, qos: EndpointQos) -> Endpoint {
        Endpoint::writer(key(n), "T", "Type", qos)
    }

    #[test]
    fn test_add_stores_mismatch_on_both_sides() {
        let mut topic = EndpointRegistry::new();
        assert!(topic.add_endpoint(writer(1, EndpointQos::best_effort())));
        assert!(topic.add_endpoint(reader(2, EndpointQos::reliable())));

        let w = topic.get(&key(1)).expect("writer");
        let r = topic.get(&key(2)).expect("reader");
        assert_eq!(w.mismatches.get(&key(2)), Some(&vec![PolicyKind::Reliability]));
        assert_eq!(r.mismatches.get(&key(1)), w.mismatches.get(&key(2)));
        assert_eq!(topic.mismatched_peer_keys(), vec![key(1), key(2)]);
        assert_eq!(
            topic.mismatched_pairs(),
            vec![(key(2), key(1), vec![PolicyKind::Reliability])]
        );
    }

    #[test]
    fn test_compatible_pair_stores_nothing() {
        let mut topic = EndpointRegistry::new();
        topic.add_endpoint(writer(1, EndpointQos::reliable()));
        topic.add_endpoint(reader(2, EndpointQos::best_effort()));
        assert!(topic.mismatched_peer_keys().is_empty());
        assert!(topic.iter().all(|e| e.mismatches.is_empty()));
    }

    #[test]
    fn test_same_direction_never_checked() {
        let mut topic = EndpointRegistry::new();
        topic.add_endpoint(reader(1, EndpointQos::reliable()));
        topic.add_endpoint(reader(2, EndpointQos::best_effort().transient_local()));
        assert!(topic.mismatched_peer_keys().is_empty());
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut topic = EndpointRegistry::new();
        topic.add_endpoint(writer(1, EndpointQos::best_effort()));
        topic.add_endpoint(reader(2, EndpointQos::reliable()));

        // Same key, now compatible QoS: must not replace the stored endpoint.
        assert!(!topic.add_endpoint(reader(2, EndpointQos::best_effort())));
        assert_eq!(topic.len(), 2);
        assert_eq!(topic.mismatched_peer_keys().len(), 2);
    }

    #[test]
    fn test_remove_clears_reciprocal_entries() {
        let mut topic = EndpointRegistry::new();
        topic.add_endpoint(writer(1, EndpointQos::best_effort()));
        topic.add_endpoint(reader(2, EndpointQos::reliable()));
        topic.add_endpoint(reader(3, EndpointQos::reliable()));

        let removed = topic.remove_endpoint(&key(1)).expect("removed");
        assert_eq!(removed.mismatches.len(), 2);
        assert!(topic.iter().all(|e| e.mismatches.is_empty()));
        assert!(topic.mismatched_peer_keys().is_empty());
        assert!(topic.has_endpoints());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut topic = EndpointRegistry::new();
        topic.add_endpoint(writer(1, EndpointQos::default()));
        assert!(topic.remove_endpoint(&key(9)).is_none());
        assert_eq!(topic.len(), 1);
    }

    #[test]
    fn test_has_endpoints_single_side() {
        let mut topic = EndpointRegistry::new();
        assert!(!topic.has_endpoints());
        topic.add_endpoint(reader(1, EndpointQos::default()));
        assert!(topic.has_endpoints());
        topic.remove_endpoint(&key(1));
        assert!(topic.is_empty());
    }

    #[test]
    fn test_incoming_mismatches_are_recomputed() {
        let mut topic = EndpointRegistry::new();
        let mut stale = reader(2, EndpointQos::default());
        stale.mismatches.insert(key(7), vec![PolicyKind::History]);
        topic.add_endpoint(stale);
        assert!(topic.mismatched_peer_keys().is_empty());
    }
}
