//! One-shot timer management.
//!
//! The shortcut router disambiguates "user paused after a prefix" from "user
//! is mid-sequence" with a single cancellable timeout. [`TimerManager`]
//! provides that primitive: deadline-ordered one-shot timers that the host
//! pumps from its event loop via [`process_expired`](TimerManager::process_expired).
//!
//! Timers never fire on their own thread. Between [`start_one_shot`](TimerManager::start_one_shot)
//! and expiry the manager is inert; the host decides when "now" is checked,
//! which keeps timer callbacks on the same logical thread as the rest of the
//! keyboard subsystem.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};

new_key_type! {
    /// A unique identifier for a pending one-shot timer.
    pub struct TimerId;
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    /// When this timer expires.
    deadline: Instant,
    /// Whether this timer is still live (not cancelled).
    active: bool,
}

/// An entry in the timer queue (min-heap by deadline).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    deadline: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.deadline.cmp(&self.deadline)
    }
}

/// Manages pending one-shot timers.
///
/// Cancellation is O(1): the timer is marked inactive and its queue entry is
/// lazily discarded the next time the queue front is inspected.
#[derive(Debug, Default)]
pub struct TimerManager {
    /// All live timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of deadlines (min-heap).
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Create a new timer manager with no pending timers.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    /// Start a one-shot timer that expires after `duration`.
    ///
    /// Returns the timer ID that can be used to cancel the timer before it
    /// fires.
    pub fn start_one_shot(&mut self, duration: Duration) -> TimerId {
        let deadline = Instant::now() + duration;

        let id = self.timers.insert(TimerData {
            deadline,
            active: true,
        });
        self.queue.push(TimerQueueEntry { id, deadline });

        tracing::trace!(target: "latchkey_core::timer", ?id, ?duration, "timer started");
        id
    }

    /// Cancel a pending timer.
    ///
    /// Returns an error if the timer has already fired or been cancelled.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        match self.timers.get_mut(id) {
            Some(timer) => {
                timer.active = false;
                self.timers.remove(id);
                tracing::trace!(target: "latchkey_core::timer", ?id, "timer cancelled");
                Ok(())
            }
            None => Err(TimerError::InvalidTimerId.into()),
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.get(id).is_some_and(|t| t.active)
    }

    /// Get the duration until the next timer expires, if any.
    ///
    /// Returns `None` if there are no pending timers. Hosts use this to bound
    /// their event-loop wait.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        // Discard cancelled timers from the front of the queue.
        while let Some(entry) = self.queue.peek() {
            if self.timers.get(entry.id).is_some_and(|t| t.active) {
                break;
            }
            self.queue.pop();
        }

        self.queue
            .peek()
            .map(|entry| entry.deadline.saturating_duration_since(Instant::now()))
    }

    /// Pop all timers whose deadline has passed.
    ///
    /// Returns the fired timer IDs in deadline order. Fired timers are
    /// removed; a timer fires at most once.
    pub fn process_expired(&mut self) -> Vec<TimerId> {
        self.process_expired_at(Instant::now())
    }

    /// Pop all timers whose deadline is at or before `now`.
    ///
    /// Identical to [`process_expired`](Self::process_expired) but with an
    /// explicit clock reading, so tests can drive time without sleeping.
    pub fn process_expired_at(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.deadline > now {
                break;
            }
            let entry = self.queue.pop().expect("peeked entry must pop");

            // Skip entries whose timer was cancelled.
            let Some(timer) = self.timers.get(entry.id) else {
                continue;
            };
            if !timer.active {
                continue;
            }

            tracing::trace!(target: "latchkey_core::timer", id = ?entry.id, "timer fired");
            self.timers.remove(entry.id);
            fired.push(entry.id);
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.iter().filter(|(_, t)| t.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut mgr = TimerManager::new();
        let start = Instant::now();
        let id = mgr.start_one_shot(Duration::from_millis(750));

        // Not yet expired.
        assert!(mgr.process_expired_at(start).is_empty());
        assert!(mgr.is_active(id));

        // Expired.
        let fired = mgr.process_expired_at(start + Duration::from_secs(1));
        assert_eq!(fired, vec![id]);
        assert!(!mgr.is_active(id));

        // Does not fire again.
        assert!(mgr.process_expired_at(start + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn test_stop_cancels() {
        let mut mgr = TimerManager::new();
        let start = Instant::now();
        let id = mgr.start_one_shot(Duration::from_millis(100));

        mgr.stop(id).unwrap();
        assert!(!mgr.is_active(id));
        assert!(mgr.process_expired_at(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_stop_twice_errors() {
        let mut mgr = TimerManager::new();
        let id = mgr.start_one_shot(Duration::from_millis(100));

        assert!(mgr.stop(id).is_ok());
        assert!(mgr.stop(id).is_err());
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut mgr = TimerManager::new();
        let start = Instant::now();
        let slow = mgr.start_one_shot(Duration::from_millis(500));
        let fast = mgr.start_one_shot(Duration::from_millis(100));

        let fired = mgr.process_expired_at(start + Duration::from_secs(1));
        assert_eq!(fired, vec![fast, slow]);
    }

    #[test]
    fn test_time_until_next_skips_cancelled() {
        let mut mgr = TimerManager::new();
        let fast = mgr.start_one_shot(Duration::from_millis(10));
        let _slow = mgr.start_one_shot(Duration::from_secs(60));

        mgr.stop(fast).unwrap();
        // The remaining deadline is the slow timer's, well over a second out.
        let next = mgr.time_until_next().unwrap();
        assert!(next > Duration::from_secs(30));
        assert_eq!(mgr.active_count(), 1);
    }
}
