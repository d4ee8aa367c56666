//! Cancellable deadline queue for message display timers.
//!
//! DESIGN
//! ======
//! Timers carry a typed [`TimerAction`] instead of a callback, so firing one
//! never needs to borrow the state it acts on. Handle ids are never reused:
//! a handle that outlived its timer can be compared against the owner's
//! stored handle and recognised as stale.

#[cfg(test)]
#[path = "timer_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::participant::SlotIndex;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    /// Advance the message slot to its next queued line.
    ShowNext(SlotIndex),
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    /// Ordered by deadline, then by scheduling order.
    pending: BTreeMap<(Instant, u64), TimerAction>,
    deadlines: HashMap<u64, Instant>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Instant, action: TimerAction) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((at, id), action);
        self.deadlines.insert(id, at);
        TimerHandle(id)
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(at) = self.deadlines.remove(&handle.0) else {
            return false;
        };
        self.pending.remove(&(at, handle.0)).is_some()
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, TimerAction)> {
        let (&(at, id), _) = self.pending.iter().next()?;
        if at > now {
            return None;
        }
        let action = self.pending.remove(&(at, id))?;
        self.deadlines.remove(&id);
        Some((TimerHandle(id), action))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }
}
