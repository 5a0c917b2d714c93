// src/simulation/scheduler.rs

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

// Band of events that run ahead of everything else due at the same instant.
const FIRST: u8 = 0;
const ORDINARY: u8 = 1;

struct Scheduled<E> {
    at: u64,
    band: u8,
    seq: u64,
    event: E,
}

// Ordering ignores the payload: (time, band, then scheduling order).
impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.band == other.band && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.band, self.seq).cmp(&(other.at, other.band, other.seq))
    }
}

/// Virtual clock and pending-event list of one replication.
///
/// Time is counted in whole days. Events due at the same instant come out
/// in the order they were scheduled, except that those scheduled with
/// `schedule_first_at` come out before all others.
pub struct EventQueue<E> {
    now: u64,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Scheduled<E>>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules `event` at day `at`. Times in the past are clamped to now.
    pub fn schedule_at(&mut self, at: u64, event: E) {
        self.push(at, ORDINARY, event);
    }

    /// Schedules `event` at day `at`, ahead of every ordinary event due then.
    pub fn schedule_first_at(&mut self, at: u64, event: E) {
        self.push(at, FIRST, event);
    }

    fn push(&mut self, at: u64, band: u8, event: E) {
        let at = at.max(self.now);
        self.pending.push(Reverse(Scheduled {
            at,
            band,
            seq: self.next_seq,
            event,
        }));
        self.next_seq += 1;
    }

    pub fn schedule_in(&mut self, delay: u64, event: E) {
        self.schedule_at(self.now.saturating_add(delay), event);
    }

    /// Pops the next event due no later than `until` and moves the clock
    /// to its time. Returns `None` once nothing is left before the horizon.
    pub fn pop_until(&mut self, until: u64) -> Option<E> {
        let due = self.pending.peek().map(|Reverse(next)| next.at)?;
        if due > until {
            return None;
        }
        let Reverse(next) = self.pending.pop()?;
        self.now = next.at;
        Some(next.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_come_out_in_time_order() {
        let mut queue = EventQueue::new();
        queue.schedule_at(5, "late");
        queue.schedule_at(1, "early");
        queue.schedule_at(3, "middle");

        assert_eq!(queue.pop_until(10), Some("early"));
        assert_eq!(queue.now(), 1);
        assert_eq!(queue.pop_until(10), Some("middle"));
        assert_eq!(queue.pop_until(10), Some("late"));
        assert_eq!(queue.now(), 5);
        assert!(queue.is_empty());
    }

    #[test]
    fn same_instant_keeps_scheduling_order() {
        let mut queue = EventQueue::new();
        for i in 0..20 {
            queue.schedule_at(2, i);
        }
        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop_until(2)).collect();
        assert_eq!(drained, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn first_band_overtakes_earlier_scheduled_events() {
        let mut queue = EventQueue::new();
        queue.schedule_at(2, "arrival");
        queue.schedule_at(2, "discharge");
        queue.schedule_first_at(2, "sample");
        queue.schedule_first_at(1, "earlier sample");

        let drained: Vec<&str> = std::iter::from_fn(|| queue.pop_until(2)).collect();
        assert_eq!(drained, vec!["earlier sample", "sample", "arrival", "discharge"]);
    }

    #[test]
    fn horizon_leaves_later_events_pending() {
        let mut queue = EventQueue::new();
        queue.schedule_at(4, 'a');
        queue.schedule_at(6, 'b');

        assert_eq!(queue.pop_until(5), Some('a'));
        assert_eq!(queue.pop_until(5), None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.now(), 4);
    }

    #[test]
    fn relative_scheduling_uses_the_current_time() {
        let mut queue = EventQueue::new();
        queue.schedule_at(3, 0);
        queue.pop_until(10);
        queue.schedule_in(2, 1);
        queue.schedule_at(0, 2);

        assert_eq!(queue.pop_until(10), Some(2));
        assert_eq!(queue.now(), 3);
        assert_eq!(queue.pop_until(10), Some(1));
        assert_eq!(queue.now(), 5);
    }
}
