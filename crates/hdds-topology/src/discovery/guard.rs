// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wake primitives shared between an observer and its discovery session.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Latching wake signal.
///
/// A `notify()` that happens before `wait()` is not lost: the pending flag
/// makes the next wait return immediately.
#[derive(Debug, Default)]
pub struct WakeSignal {
    pending: Mutex<bool>,
    condvar: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.condvar.notify_all();
    }

    /// Block until notified or until `timeout` elapses (`None` = no limit).
    ///
    /// Returns `true` if a notification was consumed. Spurious returns are
    /// possible; callers re-check their own condition.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let mut pending = self.pending.lock();
        if !*pending {
            match timeout {
                Some(timeout) => {
                    self.condvar.wait_for(&mut pending, timeout);
                }
                None => self.condvar.wait(&mut pending),
            }
        }
        std::mem::replace(&mut *pending, false)
    }
}

/// Application-triggered condition attached to a discovery wait.
///
/// Triggering it makes a blocked [`DiscoverySession::wait`] return, which
/// is how an observer interrupts an infinite wait on stop.
///
/// [`DiscoverySession::wait`]: super::DiscoverySession::wait
#[derive(Debug, Clone, Default)]
pub struct GuardCondition {
    triggered: Arc<AtomicBool>,
    signal: Arc<WakeSignal>,
}

impl GuardCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
        self.signal.notify();
    }

    pub fn reset(&self) {
        self.triggered.store(false, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Signal the session blocks on; backends also notify it when samples
    /// arrive.
    pub fn signal(&self) -> Arc<WakeSignal> {
        Arc::clone(&self.signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_notify_before_wait_is_latched() {
        let signal = WakeSignal::new();
        signal.notify();
        assert!(signal.wait(Some(Duration::from_secs(5))));
        assert!(!signal.wait(Some(Duration::from_millis(10))));
    }

    #[test]
    fn test_guard_wakes_blocked_waiter() {
        let guard = GuardCondition::new();
        let signal = guard.signal();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            signal.wait(None);
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(20));
        guard.trigger();
        let waited = waiter.join().expect("join");
        assert!(waited < Duration::from_secs(5));
        assert!(guard.is_triggered());
        guard.reset();
        assert!(!guard.is_triggered());
    }
}
