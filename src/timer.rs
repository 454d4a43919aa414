//! Single-shot, cancellable timers for a cooperative event loop.
//!
//! Nothing here sleeps or spawns: the loop asks for
//! [`next_deadline`](Timers::next_deadline), waits for input at most that
//! long, and then calls [`expire`](Timers::expire) with the current time.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle for a scheduled timer.  Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<K> {
    deadline: Instant,
    key: K,
}

/// A set of pending timers, each carrying a key of type `K`.
#[derive(Debug)]
pub struct Timers<K> {
    next_id: u64,
    pending: BTreeMap<TimerId, Pending<K>>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<K> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire at `deadline`.
    pub fn schedule(&mut self, key: K, deadline: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, Pending { deadline, key });
        id
    }

    /// Schedule `key` to fire `after` from `now`.
    pub fn schedule_in(&mut self, key: K, now: Instant, after: Duration) -> TimerId {
        self.schedule(key, now + after)
    }

    /// Cancel a timer.  Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Earliest deadline among pending timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn expire(&mut self, now: Instant) -> Vec<(TimerId, K)> {
        let mut due: Vec<(Instant, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(id, p)| (p.deadline, *id))
            .collect();
        due.sort();
        due.into_iter()
            .filter_map(|(_, id)| self.pending.remove(&id).map(|p| (id, p.key)))
            .collect()
    }
}
