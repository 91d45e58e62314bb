// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topics and participants of one domain.
//!
//! Every mutating method returns the notifications it produced, in the
//! order the changes happened; the caller publishes them.

use super::EndpointRegistry;
use crate::events::TopologyEvent;
use crate::guid::Guid;
use crate::model::{Direction, DomainId, Endpoint, Participant, ParticipantMetadata};
use crate::qos::PolicyKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Topology state of one domain.
#[derive(Debug)]
pub struct DomainRegistry {
    domain_id: DomainId,
    topics: BTreeMap<String, EndpointRegistry>,
    participants: BTreeMap<Guid, Participant>,
    /// Endpoint key -> topic name.
    topic_index: HashMap<Guid, String>,
}

impl DomainRegistry {
    pub fn new(domain_id: DomainId) -> Self {
        Self {
            domain_id,
            topics: BTreeMap::new(),
            participants: BTreeMap::new(),
            topic_index: HashMap::new(),
        }
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain_id
    }

    /// Store (or overwrite) a participant and back-link it on endpoints
    /// that were discovered before it. A discovery sample without metadata
    /// keeps metadata already learned from a status update.
    pub fn add_participant(&mut self, mut participant: Participant) -> Vec<TopologyEvent> {
        if participant.metadata.is_empty() {
            if let Some(known) = self.participants.get(&participant.key) {
                participant.metadata = known.metadata.clone();
            }
        }
        let existed = self
            .participants
            .insert(participant.key, participant.clone())
            .is_some();
        self.link_participant(&participant);

        let event = if existed {
            TopologyEvent::ParticipantUpdated {
                domain_id: self.domain_id,
                participant,
            }
        } else {
            TopologyEvent::ParticipantAdded {
                domain_id: self.domain_id,
                participant,
            }
        };
        vec![event]
    }

    /// Apply out-of-band metadata. Unknown participants are created, since
    /// the status update may arrive before the discovery sample.
    pub fn update_participant(
        &mut self,
        key: Guid,
        metadata: ParticipantMetadata,
    ) -> Vec<TopologyEvent> {
        let Some(existing) = self.participants.get_mut(&key) else {
            return self.add_participant(Participant::with_metadata(key, metadata));
        };

        existing.metadata = metadata;
        let participant = existing.clone();
        self.link_participant(&participant);
        vec![TopologyEvent::ParticipantUpdated {
            domain_id: self.domain_id,
            participant,
        }]
    }

    /// Remove a participant. Its endpoints are left alone; they leave on
    /// their own dispose samples.
    pub fn remove_participant(&mut self, key: &Guid) -> Vec<TopologyEvent> {
        match self.participants.remove(key) {
            Some(_) => vec![TopologyEvent::ParticipantRemoved {
                domain_id: self.domain_id,
                key: *key,
            }],
            None => Vec::new(),
        }
    }

    fn link_participant(&mut self, participant: &Participant) {
        for topic in self.topics.values_mut() {
            for endpoint in topic.iter_mut() {
                if endpoint.participant_key == participant.key {
                    endpoint.participant = Some(participant.clone());
                }
            }
        }
    }

    /// Register an endpoint on its topic. A key already present anywhere in
    /// the domain is ignored.
    pub fn add_endpoint(&mut self, mut endpoint: Endpoint) -> Vec<TopologyEvent> {
        if self.topic_index.contains_key(&endpoint.key) {
            tracing::trace!("[registry] endpoint {} already known", endpoint.key);
            return Vec::new();
        }

        let mut events = Vec::new();
        let key = endpoint.key;
        let topic_name = endpoint.topic_name.clone();

        if !self.topics.contains_key(&topic_name) {
            self.topics
                .insert(topic_name.clone(), EndpointRegistry::new());
            events.push(TopologyEvent::TopicCreated {
                domain_id: self.domain_id,
                topic_name: topic_name.clone(),
            });
        }

        endpoint.participant = self.participants.get(&endpoint.participant_key).cloned();

        let Some(topic) = self.topics.get_mut(&topic_name) else {
            return events;
        };
        topic.add_endpoint(endpoint);
        self.topic_index.insert(key, topic_name.clone());

        if let Some(stored) = topic.get(&key) {
            events.push(TopologyEvent::EndpointAdded {
                domain_id: self.domain_id,
                endpoint: stored.clone(),
            });
        }

        let keys = topic.mismatched_peer_keys();
        if !keys.is_empty() {
            events.push(TopologyEvent::MismatchChanged {
                domain_id: self.domain_id,
                topic_name,
                keys,
            });
        }

        events
    }

    /// Remove an endpoint by key. Unknown keys produce nothing.
    ///
    /// A surviving topic always gets a `MismatchCleared` followed, when
    /// mismatches remain, by a `MismatchChanged` with the recomputed list.
    pub fn remove_endpoint(&mut self, key: &Guid) -> Vec<TopologyEvent> {
        let Some(topic_name) = self.topic_index.remove(key) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let Some(topic) = self.topics.get_mut(&topic_name) else {
            return events;
        };

        if topic.remove_endpoint(key).is_some() {
            events.push(TopologyEvent::EndpointRemoved {
                domain_id: self.domain_id,
                key: *key,
            });
        }

        if !topic.has_endpoints() {
            self.topics.remove(&topic_name);
            events.push(TopologyEvent::TopicRemoved {
                domain_id: self.domain_id,
                topic_name,
            });
            return events;
        }

        let keys = topic.mismatched_peer_keys();
        events.push(TopologyEvent::MismatchCleared {
            domain_id: self.domain_id,
            topic_name: topic_name.clone(),
        });
        if !keys.is_empty() {
            events.push(TopologyEvent::MismatchChanged {
                domain_id: self.domain_id,
                topic_name,
                keys,
            });
        }
        events
    }

    pub fn participant(&self, key: &Guid) -> Option<&Participant> {
        self.participants.get(key)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn topic(&self, name: &str) -> Option<&EndpointRegistry> {
        self.topics.get(name)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn topic_of(&self, key: &Guid) -> Option<&str> {
        self.topic_index.get(key).map(String::as_str)
    }

    pub fn endpoint(&self, key: &Guid) -> Option<&Endpoint> {
        let topic = self.topic_index.get(key)?;
        self.topics.get(topic)?.get(key)
    }

    /// Number of endpoints known to the domain.
    pub fn endpoint_count(&self) -> usize {
        self.topic_index.len()
    }

    /// Deep copy of the whole domain.
    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            domain_id: self.domain_id,
            participants: self.participants.values().cloned().collect(),
            topics: self
                .topics
                .iter()
                .map(|(name, topic)| TopicSnapshot {
                    name: name.clone(),
                    readers: topic.endpoints(Direction::Reader).values().cloned().collect(),
                    writers: topic.endpoints(Direction::Writer).values().cloned().collect(),
                    mismatches: topic
                        .mismatched_pairs()
                        .into_iter()
                        .map(|(reader, writer, policies)| MismatchSnapshot {
                            reader,
                            writer,
                            policies,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Serializable deep copy of one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSnapshot {
    pub domain_id: DomainId,
    pub participants: Vec<Participant>,
    pub topics: Vec<TopicSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSnapshot {
    pub name: String,
    pub readers: Vec<Endpoint>,
    pub writers: Vec<Endpoint>,
    pub mismatches: Vec<MismatchSnapshot>,
}

/// One incompatible reader/writer pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchSnapshot {
    pub reader: Guid,
    pub writer: Guid,
    pub policies: Vec<PolicyKind>,
}
