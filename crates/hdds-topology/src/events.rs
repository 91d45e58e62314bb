// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Derived topology notifications and their delivery.
//!
//! Each notification is one [`TopologyEvent`] variant. Consumers either
//! register a [`TopologyListener`] callback or take a channel receiver via
//! [`Notifier::subscribe`]. Events are published synchronously, in the order
//! the changes were applied.

use crate::guid::Guid;
use crate::model::{DomainId, Endpoint, Participant};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One change of the observed topology.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TopologyEvent {
    DomainAdded {
        domain_id: DomainId,
    },
    DomainRemoved {
        domain_id: DomainId,
    },
    TopicCreated {
        domain_id: DomainId,
        topic_name: String,
    },
    TopicRemoved {
        domain_id: DomainId,
        topic_name: String,
    },
    /// Carries an independent copy of the endpoint as stored.
    EndpointAdded {
        domain_id: DomainId,
        endpoint: Endpoint,
    },
    EndpointRemoved {
        domain_id: DomainId,
        key: Guid,
    },
    /// Full, ordered list of mismatched endpoint keys on the topic.
    MismatchChanged {
        domain_id: DomainId,
        topic_name: String,
        keys: Vec<Guid>,
    },
    MismatchCleared {
        domain_id: DomainId,
        topic_name: String,
    },
    ParticipantAdded {
        domain_id: DomainId,
        participant: Participant,
    },
    ParticipantUpdated {
        domain_id: DomainId,
        participant: Participant,
    },
    ParticipantRemoved {
        domain_id: DomainId,
        key: Guid,
    },
}

impl TopologyEvent {
    pub fn domain_id(&self) -> DomainId {
        match self {
            TopologyEvent::DomainAdded { domain_id }
            | TopologyEvent::DomainRemoved { domain_id }
            | TopologyEvent::TopicCreated { domain_id, .. }
            | TopologyEvent::TopicRemoved { domain_id, .. }
            | TopologyEvent::EndpointAdded { domain_id, .. }
            | TopologyEvent::EndpointRemoved { domain_id, .. }
            | TopologyEvent::MismatchChanged { domain_id, .. }
            | TopologyEvent::MismatchCleared { domain_id, .. }
            | TopologyEvent::ParticipantAdded { domain_id, .. }
            | TopologyEvent::ParticipantUpdated { domain_id, .. }
            | TopologyEvent::ParticipantRemoved { domain_id, .. } => *domain_id,
        }
    }

    /// Short snake_case name of the variant, as used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            TopologyEvent::DomainAdded { .. } => "domain_added",
            TopologyEvent::DomainRemoved { .. } => "domain_removed",
            TopologyEvent::TopicCreated { .. } => "topic_created",
            TopologyEvent::TopicRemoved { .. } => "topic_removed",
            TopologyEvent::EndpointAdded { .. } => "endpoint_added",
            TopologyEvent::EndpointRemoved { .. } => "endpoint_removed",
            TopologyEvent::MismatchChanged { .. } => "mismatch_changed",
            TopologyEvent::MismatchCleared { .. } => "mismatch_cleared",
            TopologyEvent::ParticipantAdded { .. } => "participant_added",
            TopologyEvent::ParticipantUpdated { .. } => "participant_updated",
            TopologyEvent::ParticipantRemoved { .. } => "participant_removed",
        }
    }
}

/// Callback interface for topology notifications.
///
/// Called on the thread that applied the change, with the table lock held.
/// Implementations may query the table but must not block for long.
pub trait TopologyListener: Send + Sync {
    fn on_event(&self, event: &TopologyEvent);
}

impl<F> TopologyListener for F
where
    F: Fn(&TopologyEvent) + Send + Sync,
{
    fn on_event(&self, event: &TopologyEvent) {
        self(event)
    }
}

/// Fan-out of topology events to listeners and channel subscribers.
#[derive(Default)]
pub struct Notifier {
    listeners: Mutex<Vec<Arc<dyn TopologyListener>>>,
    subscribers: Mutex<Vec<Sender<TopologyEvent>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn TopologyListener>) {
        self.listeners.lock().push(listener);
    }

    /// Unbounded channel receiving every event published from now on.
    pub fn subscribe(&self) -> Receiver<TopologyEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver one event. Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, event: &TopologyEvent) {
        tracing::trace!("[table] notify {} (domain {})", event.kind(), event.domain_id());

        // Snapshot so a listener may register another listener re-entrantly.
        let listeners: Vec<Arc<dyn TopologyListener>> = self.listeners.lock().clone();
        for listener in &listeners {
            listener.on_event(event);
        }

        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn publish_all(&self, events: &[TopologyEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listener_and_subscriber_receive_in_order() {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        notifier.add_listener(Arc::new(move |_: &TopologyEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let rx = notifier.subscribe();

        notifier.publish_all(&[
            TopologyEvent::DomainAdded { domain_id: 0 },
            TopologyEvent::DomainRemoved { domain_id: 0 },
        ]);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(rx.try_recv(), Ok(TopologyEvent::DomainAdded { domain_id: 0 }));
        assert_eq!(rx.try_recv(), Ok(TopologyEvent::DomainRemoved { domain_id: 0 }));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let _kept = notifier.subscribe();
        drop(rx);

        notifier.publish(&TopologyEvent::DomainAdded { domain_id: 3 });
        assert_eq!(notifier.subscriber_count(), 1);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = TopologyEvent::TopicRemoved {
            domain_id: 1,
            topic_name: "Square".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "topic_removed");
        assert_eq!(json["topic_name"], "Square");
        assert_eq!(event.kind(), "topic_removed");
        assert_eq!(event.domain_id(), 1);
    }
}
