// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-domain discovery observer thread.
//!
//! Waits on the domain's built-in readers, classifies every taken sample
//! and enqueues one [`DiscoveryBatch`] per wake cycle. The observer never
//! touches topology state; the dispatcher is the only consumer.

use super::{
    DiscoveryBackend, DiscoveryBatch, DiscoveryEvent, DiscoverySession, EndpointData,
    GuardCondition, InstanceState, SampleInfo, SampleState,
};
use crate::config::ObserverConfig;
use crate::error::{Result, TopologyError};
use crate::model::{Direction, DomainId, Endpoint, Participant};
use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pause after a failed wait before the next attempt.
const WAIT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// What a sample means for the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    New,
    Remove,
}

fn classify(info: &SampleInfo) -> Option<Change> {
    match (info.sample_state, info.instance_state) {
        (_, InstanceState::NotAliveDisposed) => Some(Change::Remove),
        (SampleState::NotRead, InstanceState::Alive) => Some(Change::New),
        _ => None,
    }
}

/// Handle to one domain's observer thread.
///
/// Dropping the handle stops the thread and waits for it to exit.
pub struct DiscoveryObserver {
    domain_id: DomainId,
    generation: u64,
    running: Arc<AtomicBool>,
    guard: GuardCondition,
    thread: Option<JoinHandle<()>>,
}

impl DiscoveryObserver {
    /// Spawn the observer thread. The backend session is opened on that
    /// thread; if opening fails the thread logs it and exits, leaving the
    /// domain without discovery input.
    pub fn spawn(
        domain_id: DomainId,
        generation: u64,
        backend: Arc<dyn DiscoveryBackend>,
        queue: Sender<DiscoveryBatch>,
        config: ObserverConfig,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let guard = GuardCondition::new();

        let thread_running = Arc::clone(&running);
        let thread_guard = guard.clone();
        let name = format!("hdds-topology-observer-{}", domain_id);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                run(
                    domain_id,
                    generation,
                    backend,
                    queue,
                    config,
                    thread_running,
                    thread_guard,
                )
            })
            .map_err(|source| TopologyError::Spawn { name, source })?;

        Ok(Self {
            domain_id,
            generation,
            running,
            guard,
            thread: Some(thread),
        })
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain_id
    }

    /// Generation stamped on every batch this observer enqueues.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request stop and wake the blocked wait. Does not wait for exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.guard.trigger();
    }

    /// Wait for the thread to exit. Call [`stop`](Self::stop) first.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("[observer] domain {} thread panicked", self.domain_id);
            }
        }
    }

    /// `true` while stop has not been requested and the thread has not exited.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for DiscoveryObserver {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

impl std::fmt::Debug for DiscoveryObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryObserver")
            .field("domain_id", &self.domain_id)
            .field("generation", &self.generation)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run(
    domain_id: DomainId,
    generation: u64,
    backend: Arc<dyn DiscoveryBackend>,
    queue: Sender<DiscoveryBatch>,
    config: ObserverConfig,
    running: Arc<AtomicBool>,
    guard: GuardCondition,
) {
    let mut session = match backend.open(domain_id, guard.clone()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("[observer] domain {}: cannot open discovery: {}", domain_id, e);
            running.store(false, Ordering::Release);
            return;
        }
    };
    tracing::info!("[observer] domain {} started", domain_id);

    let timeout = config.wait_timeout();
    while running.load(Ordering::Acquire) {
        let triggered = match session.wait(timeout) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!("[observer] domain {}: wait failed: {}", domain_id, e);
                // Interrupted early by stop or by new samples.
                guard.signal().wait(Some(WAIT_RETRY_BACKOFF));
                0
            }
        };
        if guard.is_triggered() {
            guard.reset();
        }
        if triggered == 0 || !running.load(Ordering::Acquire) {
            continue;
        }

        let batch = collect_batch(domain_id, generation, session.as_mut(), &config);
        if batch.is_empty() {
            continue;
        }

        tracing::debug!(
            "[observer] domain {}: enqueue batch of {} events",
            domain_id,
            batch.len()
        );
        if queue.send(batch).is_err() {
            tracing::warn!("[observer] domain {}: event queue closed", domain_id);
            break;
        }
    }

    tracing::info!("[observer] domain {} stopped", domain_id);
}

/// Drain every built-in reader of `session` into one batch.
pub(crate) fn collect_batch(
    domain_id: DomainId,
    generation: u64,
    session: &mut dyn DiscoverySession,
    config: &ObserverConfig,
) -> DiscoveryBatch {
    let mut batch = DiscoveryBatch::new(domain_id, generation);

    for sample in session.take_participants() {
        tracing::trace!("[observer] participant {} {:?}", sample.data.key, sample.info);
        match classify(&sample.info) {
            Some(Change::New) => {
                batch.push(DiscoveryEvent::NewParticipant(Participant::new(sample.data.key)))
            }
            Some(Change::Remove) => batch.push(DiscoveryEvent::RemoveParticipant(sample.data.key)),
            None => {}
        }
    }

    for sample in session.take_participant_status() {
        if classify(&sample.info) == Some(Change::New) {
            batch.push(DiscoveryEvent::UpdateParticipant {
                key: sample.data.key,
                metadata: sample.data.metadata,
            });
        }
    }

    let publications = session.take_publications();
    let subscriptions = session.take_subscriptions();
    let endpoints = publications
        .into_iter()
        .map(|s| (Direction::Writer, s))
        .chain(subscriptions.into_iter().map(|s| (Direction::Reader, s)));

    for (direction, sample) in endpoints {
        if config.is_ignored(&sample.data.topic_name) {
            continue;
        }
        tracing::trace!(
            "[observer] {} {} on '{}' {:?}",
            direction,
            sample.data.key,
            sample.data.topic_name,
            sample.info
        );
        match classify(&sample.info) {
            Some(Change::New) => batch.push(DiscoveryEvent::NewEndpoint(to_endpoint(
                direction,
                sample.data,
            ))),
            Some(Change::Remove) => batch.push(DiscoveryEvent::RemoveEndpoint(sample.data.key)),
            None => {}
        }
    }

    batch
}

fn to_endpoint(direction: Direction, data: EndpointData) -> Endpoint {
    Endpoint::new(
        data.key,
        direction,
        data.topic_name,
        data.type_name,
        data.participant_key,
        data.qos,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{ParticipantData, ParticipantStatusData, Sample};
    use crate::guid::Guid;
    use crate::model::ParticipantMetadata;
    use crate::qos::EndpointQos;
    use crossbeam::channel;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct ScriptedSession {
        participants: Vec<Sample<ParticipantData>>,
        publications: Vec<Sample<EndpointData>>,
        subscriptions: Vec<Sample<EndpointData>>,
        status: Vec<Sample<ParticipantStatusData>>,
    }

    impl DiscoverySession for ScriptedSession {
        fn wait(&mut self, _timeout: Option<Duration>) -> Result<usize> {
            Ok(1)
        }

        fn take_participants(&mut self) -> Vec<Sample<ParticipantData>> {
            std::mem::take(&mut self.participants)
        }

        fn take_publications(&mut self) -> Vec<Sample<EndpointData>> {
            std::mem::take(&mut self.publications)
        }

        fn take_subscriptions(&mut self) -> Vec<Sample<EndpointData>> {
            std::mem::take(&mut self.subscriptions)
        }

        fn take_participant_status(&mut self) -> Vec<Sample<ParticipantStatusData>> {
            std::mem::take(&mut self.status)
        }
    }

    fn key(n: u8) -> Guid {
        Guid::new([n; 12], [0, 0, 0, 3])
    }

    /// Backend whose sessions fail every wait, counting the attempts.
    struct BrokenBackend {
        waits: Arc<AtomicUsize>,
    }

    struct BrokenSession {
        domain_id: DomainId,
        waits: Arc<AtomicUsize>,
    }

    impl DiscoveryBackend for BrokenBackend {
        fn open(
            &self,
            domain_id: DomainId,
            _guard: GuardCondition,
        ) -> Result<Box<dyn DiscoverySession>> {
            Ok(Box::new(BrokenSession {
                domain_id,
                waits: Arc::clone(&self.waits),
            }))
        }
    }

    impl DiscoverySession for BrokenSession {
        fn wait(&mut self, _timeout: Option<Duration>) -> Result<usize> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            Err(TopologyError::discovery(self.domain_id, "broken waitset"))
        }

        fn take_participants(&mut self) -> Vec<Sample<ParticipantData>> {
            Vec::new()
        }

        fn take_publications(&mut self) -> Vec<Sample<EndpointData>> {
            Vec::new()
        }

        fn take_subscriptions(&mut self) -> Vec<Sample<EndpointData>> {
            Vec::new()
        }
    }

    #[test]
    fn test_failing_wait_backs_off_and_keeps_running() {
        let waits = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(BrokenBackend {
            waits: Arc::clone(&waits),
        });
        let (tx, _rx) = channel::unbounded();
        let mut observer =
            DiscoveryObserver::spawn(4, 0, backend, tx, ObserverConfig::default()).expect("spawn");

        thread::sleep(Duration::from_millis(350));
        assert!(observer.is_running());
        observer.stop();
        observer.join();

        let attempts = waits.load(Ordering::SeqCst);
        assert!(attempts >= 2, "observer gave up after {} waits", attempts);
        assert!(attempts <= 10, "{} waits without back-off", attempts);
    }

    #[test]
    fn test_classify_states() {
        assert_eq!(classify(&SampleInfo::alive()), Some(Change::New));
        assert_eq!(classify(&SampleInfo::disposed()), Some(Change::Remove));
        let read_alive = SampleInfo {
            sample_state: SampleState::Read,
            instance_state: InstanceState::Alive,
        };
        assert_eq!(classify(&read_alive), None);
        let no_writers = SampleInfo {
            sample_state: SampleState::NotRead,
            instance_state: InstanceState::NotAliveNoWriters,
        };
        assert_eq!(classify(&no_writers), None);
    }

    #[test]
    fn test_collect_batch_orders_and_filters() {
        let mut session = ScriptedSession {
            participants: vec![
                Sample::alive(ParticipantData { key: key(1) }),
                Sample::disposed(ParticipantData { key: key(2) }),
            ],
            publications: vec![
                Sample::alive(EndpointData::new(key(3), "Square", "Shape", EndpointQos::reliable())),
                Sample::alive(EndpointData::new(key(4), "DCPSHeartbeat", "HB", EndpointQos::default())),
            ],
            subscriptions: vec![Sample::disposed(EndpointData::new(
                key(5),
                "Square",
                "Shape",
                EndpointQos::default(),
            ))],
            status: vec![Sample::alive(ParticipantStatusData {
                key: key(1),
                metadata: ParticipantMetadata {
                    process_name: Some("talker".into()),
                    ..Default::default()
                },
            })],
        };

        let batch = collect_batch(7, 2, &mut session, &ObserverConfig::default());
        assert_eq!(batch.domain_id, 7);
        assert_eq!(batch.generation, 2);
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.events[0], DiscoveryEvent::NewParticipant(Participant::new(key(1))));
        assert_eq!(batch.events[1], DiscoveryEvent::RemoveParticipant(key(2)));
        assert!(matches!(batch.events[2], DiscoveryEvent::UpdateParticipant { .. }));
        match &batch.events[3] {
            DiscoveryEvent::NewEndpoint(e) => {
                assert_eq!(e.key, key(3));
                assert_eq!(e.direction, Direction::Writer);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(batch.events[4], DiscoveryEvent::RemoveEndpoint(key(5)));

        assert!(collect_batch(7, 2, &mut session, &ObserverConfig::default()).is_empty());
    }
}
