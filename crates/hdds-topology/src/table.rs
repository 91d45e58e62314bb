// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain table: domain id -> registry plus its observer.
//!
//! All topology state sits behind one reentrant lock. Mutations run with
//! the lock held; notifications are published while it is still held but
//! with the inner borrow released, so a listener can query the table from
//! its callback and sees the fully-applied state.

use crate::config::ObserverConfig;
use crate::discovery::{DiscoveryBackend, DiscoveryBatch, DiscoveryEvent, DiscoveryObserver};
use crate::error::Result;
use crate::events::{Notifier, TopologyEvent, TopologyListener};
use crate::guid::Guid;
use crate::model::{Direction, DomainId, Endpoint, Participant};
use crate::registry::{DomainRegistry, DomainSnapshot};
use crossbeam::channel::{Receiver, Sender};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

struct DomainEntry {
    generation: u64,
    registry: DomainRegistry,
    observer: Option<DiscoveryObserver>,
}

/// Process-wide set of observed domains.
pub struct DomainTable {
    domains: ReentrantMutex<RefCell<HashMap<DomainId, DomainEntry>>>,
    /// Next generation per domain id; bumped on every add.
    generations: Mutex<HashMap<DomainId, u64>>,
    notifier: Notifier,
    backend: Arc<dyn DiscoveryBackend>,
    queue: Sender<DiscoveryBatch>,
    observer_config: ObserverConfig,
}

impl DomainTable {
    /// Create a table whose observers feed `queue`.
    pub fn new(
        backend: Arc<dyn DiscoveryBackend>,
        queue: Sender<DiscoveryBatch>,
        observer_config: ObserverConfig,
    ) -> Self {
        Self {
            domains: ReentrantMutex::new(RefCell::new(HashMap::new())),
            generations: Mutex::new(HashMap::new()),
            notifier: Notifier::new(),
            backend,
            queue,
            observer_config,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn TopologyListener>) {
        self.notifier.add_listener(listener);
    }

    pub fn subscribe(&self) -> Receiver<TopologyEvent> {
        self.notifier.subscribe()
    }

    /// Start observing `domain_id`. Returns `false` if it was already observed.
    pub fn add_domain(&self, domain_id: DomainId) -> Result<bool> {
        let guard = self.domains.lock();
        if guard.borrow().contains_key(&domain_id) {
            return Ok(false);
        }

        let generation = {
            let mut generations = self.generations.lock();
            let next = generations.entry(domain_id).or_insert(0);
            let current = *next;
            *next += 1;
            current
        };
        let observer = DiscoveryObserver::spawn(
            domain_id,
            generation,
            Arc::clone(&self.backend),
            self.queue.clone(),
            self.observer_config.clone(),
        )?;
        guard.borrow_mut().insert(
            domain_id,
            DomainEntry {
                generation,
                registry: DomainRegistry::new(domain_id),
                observer: Some(observer),
            },
        );

        tracing::info!("[table] domain {} added (generation {})", domain_id, generation);
        self.notifier
            .publish(&TopologyEvent::DomainAdded { domain_id });
        Ok(true)
    }

    /// Stop observing `domain_id` and drop its topology. Returns `false` if
    /// the domain was not observed.
    pub fn remove_domain(&self, domain_id: DomainId) -> bool {
        let entry = {
            let guard = self.domains.lock();
            let removed = guard.borrow_mut().remove(&domain_id);
            let Some(entry) = removed else {
                return false;
            };
            if let Some(observer) = &entry.observer {
                observer.stop();
            }
            tracing::info!("[table] domain {} removed", domain_id);
            self.notifier
                .publish(&TopologyEvent::DomainRemoved { domain_id });
            entry
        };

        // Joins the observer thread, outside the lock.
        drop(entry);
        true
    }

    /// Stop every observer, wait for all of them to exit, then clear the
    /// table.
    pub fn shutdown(&self) {
        let mut observers: Vec<DiscoveryObserver> = {
            let guard = self.domains.lock();
            let mut domains = guard.borrow_mut();
            domains
                .values_mut()
                .filter_map(|entry| entry.observer.take())
                .collect()
        };

        for observer in &observers {
            observer.stop();
        }
        for observer in &mut observers {
            observer.join();
        }
        drop(observers);

        let guard = self.domains.lock();
        let mut ids: Vec<DomainId> = guard.borrow_mut().drain().map(|(id, _)| id).collect();
        ids.sort_unstable();
        for domain_id in ids {
            self.notifier
                .publish(&TopologyEvent::DomainRemoved { domain_id });
        }
        tracing::info!("[table] shut down");
    }

    /// Apply one observer batch. Returns the number of notifications
    /// published. Batches for unknown domains, or left over from an earlier
    /// incarnation of a removed and re-added domain, are dropped.
    pub fn apply(&self, batch: DiscoveryBatch) -> usize {
        let guard = self.domains.lock();
        let DiscoveryBatch {
            domain_id,
            generation,
            events,
        } = batch;
        let mut published = 0;

        for event in events {
            let notifications = {
                let mut domains = guard.borrow_mut();
                let Some(entry) = domains.get_mut(&domain_id) else {
                    tracing::trace!("[table] dropping batch for unknown domain {}", domain_id);
                    break;
                };
                if entry.generation != generation {
                    tracing::debug!(
                        "[table] dropping stale batch for domain {} (generation {}, current {})",
                        domain_id,
                        generation,
                        entry.generation
                    );
                    break;
                }
                apply_event(&mut entry.registry, event)
            };
            published += notifications.len();
            self.notifier.publish_all(&notifications);
        }

        published
    }

    /// Run `f` on one domain's registry with the lock held. `f` must not
    /// call back into a table mutator.
    fn with_domain<R>(
        &self,
        domain_id: DomainId,
        f: impl FnOnce(&DomainRegistry) -> R,
    ) -> Option<R> {
        let guard = self.domains.lock();
        let domains = guard.borrow();
        domains.get(&domain_id).map(|entry| f(&entry.registry))
    }

    pub fn domains(&self) -> Vec<DomainId> {
        let guard = self.domains.lock();
        let mut ids: Vec<DomainId> = guard.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, domain_id: DomainId) -> bool {
        self.domains.lock().borrow().contains_key(&domain_id)
    }

    /// Endpoints of one direction on a topic, as independent copies.
    pub fn endpoints(
        &self,
        domain_id: DomainId,
        topic_name: &str,
        direction: Direction,
    ) -> BTreeMap<Guid, Endpoint> {
        self.with_domain(domain_id, |registry| {
            registry
                .topic(topic_name)
                .map(|topic| topic.endpoints(direction).clone())
        })
        .flatten()
        .unwrap_or_default()
    }

    pub fn participant(&self, domain_id: DomainId, key: &Guid) -> Option<Participant> {
        self.with_domain(domain_id, |registry| registry.participant(key).cloned())
            .flatten()
    }

    pub fn participants(&self, domain_id: DomainId) -> Vec<Participant> {
        self.with_domain(domain_id, |registry| {
            registry.participants().cloned().collect()
        })
        .unwrap_or_default()
    }

    pub fn topics(&self, domain_id: DomainId) -> Vec<String> {
        self.with_domain(domain_id, |registry| {
            registry.topic_names().map(str::to_string).collect()
        })
        .unwrap_or_default()
    }

    pub fn topic_of(&self, domain_id: DomainId, key: &Guid) -> Option<String> {
        self.with_domain(domain_id, |registry| registry.topic_of(key).map(str::to_string))
            .flatten()
    }

    /// Ordered mismatched endpoint keys on a topic.
    pub fn mismatches(&self, domain_id: DomainId, topic_name: &str) -> Vec<Guid> {
        self.with_domain(domain_id, |registry| {
            registry
                .topic(topic_name)
                .map(|topic| topic.mismatched_peer_keys())
        })
        .flatten()
        .unwrap_or_default()
    }

    pub fn snapshot(&self, domain_id: DomainId) -> Option<DomainSnapshot> {
        self.with_domain(domain_id, DomainRegistry::snapshot)
    }
}

impl std::fmt::Debug for DomainTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainTable")
            .field("domains", &self.domains())
            .field("notifier", &self.notifier)
            .finish()
    }
}

fn apply_event(registry: &mut DomainRegistry, event: DiscoveryEvent) -> Vec<TopologyEvent> {
    match event {
        DiscoveryEvent::NewParticipant(participant) => registry.add_participant(participant),
        DiscoveryEvent::RemoveParticipant(key) => registry.remove_participant(&key),
        DiscoveryEvent::UpdateParticipant { key, metadata } => {
            registry.update_participant(key, metadata)
        }
        DiscoveryEvent::NewEndpoint(endpoint) => registry.add_endpoint(endpoint),
        DiscoveryEvent::RemoveEndpoint(key) => registry.remove_endpoint(&key),
    }
}
