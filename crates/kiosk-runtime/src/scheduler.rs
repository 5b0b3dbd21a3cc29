#![forbid(unsafe_code)]

//! Keyed one-shot timers.
//!
//! Every timer has a key. Scheduling a key that is already pending replaces
//! the old entry, and cancelling a key removes it. Due timers come out in
//! deadline order; timers sharing a deadline come out in the order they were
//! scheduled.
//!
//! Time is a [`Duration`] since an arbitrary origin supplied by a [`Clock`]:
//! [`SystemClock`] for the real program and [`ManualClock`] for tests.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::program::TimerKey;

/// Source of "now" for the scheduler.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Jump to `at`. Never moves backwards.
    pub fn set(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }
}

/// Ordering slot: deadline first, then scheduling sequence.
type Slot = (Duration, u64);

struct Entry<M> {
    key: TimerKey,
    msg: M,
}

/// Pending timers keyed by [`TimerKey`].
pub struct Scheduler<M> {
    queue: BTreeMap<Slot, Entry<M>>,
    by_key: HashMap<TimerKey, Slot>,
    next_seq: u64,
}

impl<M> Default for Scheduler<M> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            by_key: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<M> Scheduler<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `msg` under `key` to fire `after` from `now`, replacing any
    /// pending timer with the same key.
    pub fn schedule(&mut self, key: TimerKey, now: Duration, after: Duration, msg: M) {
        self.cancel(key);
        let slot = (now.saturating_add(after), self.next_seq);
        self.next_seq += 1;
        self.queue.insert(slot, Entry { key, msg });
        self.by_key.insert(key, slot);
    }

    /// Remove the timer under `key`. Returns `true` if one was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        match self.by_key.remove(key) {
            Some(slot) => self.queue.remove(&slot).is_some(),
            None => false,
        }
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer whose deadline is at or before `now`.
    ///
    /// Returns the key, its deadline and the message.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerKey, Duration, M)> {
        let slot = *self.queue.keys().next()?;
        if slot.0 > now {
            return None;
        }
        let entry = self.queue.remove(&slot)?;
        self.by_key.remove(entry.key);
        Some((entry.key, slot.0, entry.msg))
    }

    /// Deadline of the timer under `key`, if pending.
    pub fn deadline(&self, key: &str) -> Option<Duration> {
        self.by_key.get(key).map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Keys of every pending timer in firing order.
    pub fn pending_keys(&self) -> Vec<TimerKey> {
        self.queue.values().map(|e| e.key).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.by_key.clear();
    }
}

impl<M> std::fmt::Debug for Scheduler<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_keys())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
