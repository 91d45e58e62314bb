// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(dead_code)]

use crossbeam::channel::Receiver;
use hdds_topology::{Guid, TopologyEvent};
use std::time::{Duration, Instant};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoint GUID `entity` owned by participant prefix `participant`.
pub fn endpoint_key(participant: u8, entity: u8) -> Guid {
    let mut prefix = [0u8; 12];
    prefix[0] = 0x01;
    prefix[11] = participant;
    Guid::new(prefix, [0, 0, entity, 0x02])
}

/// Receive exactly `count` events, failing if they do not arrive in time.
pub fn take_events(rx: &Receiver<TopologyEvent>, count: usize) -> Vec<TopologyEvent> {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut events = Vec::with_capacity(count);
    while events.len() < count {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(event) => events.push(event),
            Err(_) => panic!(
                "timed out after {} of {} events: {:?}",
                events.len(),
                count,
                events
            ),
        }
    }
    events
}

/// Receive events until one matches `predicate`; returns everything seen.
pub fn events_until(
    rx: &Receiver<TopologyEvent>,
    predicate: impl Fn(&TopologyEvent) -> bool,
) -> Vec<TopologyEvent> {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut events = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(event) => {
                let done = predicate(&event);
                events.push(event);
                if done {
                    return events;
                }
            }
            Err(_) => panic!("timed out waiting for event, seen: {:?}", events),
        }
    }
}

/// Assert that nothing else arrives within `quiet`.
pub fn assert_quiet(rx: &Receiver<TopologyEvent>, quiet: Duration) {
    if let Ok(event) = rx.recv_timeout(quiet) {
        panic!("unexpected event {:?}", event);
    }
}

/// Poll `condition` until it holds or the timeout expires.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn kinds(events: &[TopologyEvent]) -> Vec<&'static str> {
    events.iter().map(TopologyEvent::kind).collect()
}
