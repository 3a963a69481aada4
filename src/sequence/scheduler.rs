// SPDX-License-Identifier: GPL-3.0-only

//! Logical clock with a delayed-event queue
//!
//! Time only moves when the owner advances it, so sequences can be driven
//! by a real timer in the app and by plain `advance_by` calls in tests.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<E> {
    due: Duration,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal deadlines fire in scheduling order
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of events keyed by their logical due time
pub struct TimerQueue<E> {
    now: Duration,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Entry<E>>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current logical time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedule `event` to become due `delay` after the current time
    pub fn schedule_after(&mut self, delay: Duration, event: E) {
        let entry = Entry {
            due: self.now + delay,
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// Due time of the earliest pending event
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    /// Time left until the earliest pending event (zero if overdue)
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|due| due.saturating_sub(self.now))
    }

    /// Remove and return the earliest event due at or before `now`
    ///
    /// The clock is moved forward to the event's due time so anything it
    /// schedules is measured from the moment it fired.
    pub fn pop_due(&mut self, now: Duration) -> Option<E> {
        if self.next_deadline()? > now {
            return None;
        }
        let Reverse(entry) = self.heap.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.event)
    }

    /// Move the clock to `t` without firing anything (never backwards)
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    pub fn advance_by(&mut self, d: Duration) {
        self.now += d;
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_events_fire_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(300), "c");
        q.schedule_after(ms(100), "a");
        q.schedule_after(ms(200), "b");

        assert_eq!(q.next_deadline(), Some(ms(100)));
        assert_eq!(q.pop_due(ms(50)), None);

        let target = ms(1000);
        let fired: Vec<_> = std::iter::from_fn(|| q.pop_due(target)).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(10), 1);
        q.schedule_after(ms(10), 2);
        q.schedule_after(ms(10), 3);
        let fired: Vec<_> = std::iter::from_fn(|| q.pop_due(ms(10))).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_pop_moves_clock_to_due_time() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(100), ());
        q.pop_due(ms(500));
        assert_eq!(q.now(), ms(100));

        // Scheduled from the firing time, not from the target
        q.schedule_after(ms(100), ());
        assert_eq!(q.next_deadline(), Some(ms(200)));
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut q: TimerQueue<()> = TimerQueue::new();
        q.advance_by(ms(50));
        q.advance_to(ms(10));
        assert_eq!(q.now(), ms(50));
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(1), ());
        q.clear();
        assert_eq!(q.len(), 0);
        assert_eq!(q.pop_due(ms(100)), None);
        assert_eq!(q.time_until_next(), None);
    }
}
