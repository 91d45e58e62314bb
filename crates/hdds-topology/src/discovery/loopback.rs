// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory discovery backend.
//!
//! Each domain has a feed of pending built-in samples. Producers (tests,
//! capture replay) push samples; the session opened by the domain's
//! observer takes them. Samples pushed before the session exists stay
//! queued until it does.

use super::{
    BuiltinSample, DiscoveryBackend, DiscoverySession, EndpointData, GuardCondition,
    ParticipantData, ParticipantStatusData, Sample, WakeSignal,
};
use crate::error::{Result, TopologyError};
use crate::guid::Guid;
use crate::model::{DomainId, ParticipantMetadata};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct DomainFeed {
    participants: VecDeque<Sample<ParticipantData>>,
    publications: VecDeque<Sample<EndpointData>>,
    subscriptions: VecDeque<Sample<EndpointData>>,
    status: VecDeque<Sample<ParticipantStatusData>>,
    /// Last announced data per endpoint key, reused for dispose samples.
    endpoints: HashMap<Guid, EndpointData>,
    wait_failures: usize,
    signals: Vec<Arc<WakeSignal>>,
    open_sessions: usize,
}

impl DomainFeed {
    /// Number of built-in readers with data, as a waitset would count them.
    fn triggered(&self) -> usize {
        [
            !self.participants.is_empty(),
            !self.publications.is_empty(),
            !self.subscriptions.is_empty(),
            !self.status.is_empty(),
        ]
        .iter()
        .filter(|has_data| **has_data)
        .count()
    }

    fn pending(&self) -> usize {
        self.participants.len() + self.publications.len() + self.subscriptions.len() + self.status.len()
    }

    fn wake(&self) {
        for signal in &self.signals {
            signal.notify();
        }
    }
}

#[derive(Default)]
struct LoopbackState {
    feeds: HashMap<DomainId, DomainFeed>,
    refused: HashSet<DomainId>,
}

/// In-memory [`DiscoveryBackend`], cheap to clone (shared state).
#[derive(Clone, Default)]
pub struct LoopbackDiscovery {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one built-in sample on `domain_id` and wake its session.
    pub fn push(&self, domain_id: DomainId, sample: BuiltinSample) {
        let mut state = self.state.lock();
        let feed = state.feeds.entry(domain_id).or_default();
        match sample {
            BuiltinSample::Participant(s) => feed.participants.push_back(s),
            BuiltinSample::Publication(s) => {
                feed.endpoints.insert(s.data.key, s.data.clone());
                feed.publications.push_back(s);
            }
            BuiltinSample::Subscription(s) => {
                feed.endpoints.insert(s.data.key, s.data.clone());
                feed.subscriptions.push_back(s);
            }
            BuiltinSample::ParticipantStatus(s) => feed.status.push_back(s),
        }
        feed.wake();
    }

    pub fn announce_participant(&self, domain_id: DomainId, key: Guid) {
        self.push(
            domain_id,
            BuiltinSample::Participant(Sample::alive(ParticipantData { key })),
        );
    }

    pub fn dispose_participant(&self, domain_id: DomainId, key: Guid) {
        self.push(
            domain_id,
            BuiltinSample::Participant(Sample::disposed(ParticipantData { key })),
        );
    }

    pub fn announce_writer(&self, domain_id: DomainId, data: EndpointData) {
        self.push(domain_id, BuiltinSample::Publication(Sample::alive(data)));
    }

    pub fn announce_reader(&self, domain_id: DomainId, data: EndpointData) {
        self.push(domain_id, BuiltinSample::Subscription(Sample::alive(data)));
    }

    pub fn dispose_writer(&self, domain_id: DomainId, key: Guid) {
        let data = self.last_known(domain_id, key);
        self.push(domain_id, BuiltinSample::Publication(Sample::disposed(data)));
    }

    pub fn dispose_reader(&self, domain_id: DomainId, key: Guid) {
        let data = self.last_known(domain_id, key);
        self.push(domain_id, BuiltinSample::Subscription(Sample::disposed(data)));
    }

    pub fn update_participant_status(
        &self,
        domain_id: DomainId,
        key: Guid,
        metadata: ParticipantMetadata,
    ) {
        self.push(
            domain_id,
            BuiltinSample::ParticipantStatus(Sample::alive(ParticipantStatusData { key, metadata })),
        );
    }

    /// Make the next `count` waits on `domain_id` fail.
    pub fn inject_wait_failures(&self, domain_id: DomainId, count: usize) {
        let mut state = self.state.lock();
        let feed = state.feeds.entry(domain_id).or_default();
        feed.wait_failures += count;
        feed.wake();
    }

    /// Refuse to open sessions for `domain_id`.
    pub fn refuse_domain(&self, domain_id: DomainId) {
        self.state.lock().refused.insert(domain_id);
    }

    /// Samples queued on `domain_id` and not yet taken.
    pub fn pending(&self, domain_id: DomainId) -> usize {
        self.state
            .lock()
            .feeds
            .get(&domain_id)
            .map_or(0, DomainFeed::pending)
    }

    pub fn open_sessions(&self, domain_id: DomainId) -> usize {
        self.state
            .lock()
            .feeds
            .get(&domain_id)
            .map_or(0, |feed| feed.open_sessions)
    }

    fn last_known(&self, domain_id: DomainId, key: Guid) -> EndpointData {
        self.state
            .lock()
            .feeds
            .get(&domain_id)
            .and_then(|feed| feed.endpoints.get(&key).cloned())
            .unwrap_or_else(|| EndpointData::new(key, "", "", Default::default()))
    }
}

impl DiscoveryBackend for LoopbackDiscovery {
    fn open(
        &self,
        domain_id: DomainId,
        guard: GuardCondition,
    ) -> Result<Box<dyn DiscoverySession>> {
        let mut state = self.state.lock();
        if state.refused.contains(&domain_id) {
            return Err(TopologyError::discovery(domain_id, "domain refused by backend"));
        }

        let signal = guard.signal();
        let feed = state.feeds.entry(domain_id).or_default();
        feed.signals.push(Arc::clone(&signal));
        feed.open_sessions += 1;

        Ok(Box::new(LoopbackSession {
            domain_id,
            state: Arc::clone(&self.state),
            guard,
            signal,
        }))
    }
}

struct LoopbackSession {
    domain_id: DomainId,
    state: Arc<Mutex<LoopbackState>>,
    guard: GuardCondition,
    signal: Arc<WakeSignal>,
}

impl LoopbackSession {
    fn with_feed<R>(&self, f: impl FnOnce(&mut DomainFeed) -> R) -> R {
        let mut state = self.state.lock();
        f(state.feeds.entry(self.domain_id).or_default())
    }
}

impl DiscoverySession for LoopbackSession {
    fn wait(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let (failed, mut triggered) = self.with_feed(|feed| {
                if feed.wait_failures > 0 {
                    feed.wait_failures -= 1;
                    (true, 0)
                } else {
                    (false, feed.triggered())
                }
            });
            if failed {
                return Err(TopologyError::discovery(
                    self.domain_id,
                    "waitset wait failed (injected)",
                ));
            }
            if self.guard.is_triggered() {
                triggered += 1;
            }
            if triggered > 0 {
                return Ok(triggered);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(0);
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            self.signal.wait(remaining);
        }
    }

    fn take_participants(&mut self) -> Vec<Sample<ParticipantData>> {
        self.with_feed(|feed| feed.participants.drain(..).collect())
    }

    fn take_publications(&mut self) -> Vec<Sample<EndpointData>> {
        self.with_feed(|feed| feed.publications.drain(..).collect())
    }

    fn take_subscriptions(&mut self) -> Vec<Sample<EndpointData>> {
        self.with_feed(|feed| feed.subscriptions.drain(..).collect())
    }

    fn take_participant_status(&mut self) -> Vec<Sample<ParticipantStatusData>> {
        self.with_feed(|feed| feed.status.drain(..).collect())
    }
}

impl Drop for LoopbackSession {
    fn drop(&mut self) {
        let signal = Arc::clone(&self.signal);
        self.with_feed(|feed| {
            feed.signals.retain(|s| !Arc::ptr_eq(s, &signal));
            feed.open_sessions = feed.open_sessions.saturating_sub(1);
        });
    }
}
