//! Spaced-repetition queue for missed questions.
//!
//! A min-heap keyed by due time. Entries with equal due times come out in
//! insertion order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// A missed question waiting to be shown again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueEntry {
    /// Bank position of the question.
    pub question: usize,
    pub due: Instant,
    seq: u64,
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct RepetitionQueue {
    offsets: Vec<Duration>,
    heap: BinaryHeap<Reverse<DueEntry>>,
    next_seq: u64,
}

impl RepetitionQueue {
    /// A queue that schedules one entry per offset on every miss.
    ///
    /// Zero offsets are dropped so every entry lands strictly in the future.
    pub fn new(offsets: Vec<Duration>) -> Self {
        let offsets = offsets.into_iter().filter(|o| !o.is_zero()).collect();
        Self {
            offsets,
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule re-presentations of a missed question relative to `now`.
    ///
    /// Offsets that would overflow the clock are skipped.
    pub fn schedule(&mut self, question: usize, now: Instant) {
        let mut scheduled = 0;
        for offset in &self.offsets {
            let Some(due) = now.checked_add(*offset) else {
                tracing::warn!(question, ?offset, "repetition offset out of range, not scheduled");
                continue;
            };
            let entry = DueEntry {
                question,
                due,
                seq: self.next_seq,
            };
            self.next_seq += 1;
            self.heap.push(Reverse(entry));
            scheduled += 1;
        }
        tracing::debug!(
            question,
            scheduled,
            queued = self.heap.len(),
            "scheduled for repetition"
        );
    }

    /// Remove and return the earliest entry whose due time has passed.
    pub fn pop_due(&mut self, now: Instant) -> Option<DueEntry> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.due <= now => self.heap.pop().map(|Reverse(e)| e),
            _ => None,
        }
    }

    /// Put back an entry taken by [`pop_due`](Self::pop_due) for a turn that
    /// was never answered.
    pub fn restore(&mut self, entry: DueEntry) {
        self.heap.push(Reverse(entry));
    }

    /// Earliest scheduled due time, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn queue() -> RepetitionQueue {
        RepetitionQueue::new(vec![minutes(5), minutes(25), minutes(120)])
    }

    #[test]
    fn unrepresentable_due_times_are_skipped() {
        let mut q = RepetitionQueue::new(vec![minutes(5), Duration::MAX]);
        let t = Instant::now();
        q.schedule(7, t);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_due(), Some(t + minutes(5)));
    }

    #[test]
    fn nothing_due_at_schedule_time() {
        let mut q = queue();
        let t = Instant::now();
        q.schedule(3, t);
        assert_eq!(q.len(), 3);
        assert!(q.pop_due(t).is_none());
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn due_after_largest_offset() {
        let mut q = queue();
        let t = Instant::now();
        q.schedule(3, t);
        let later = t + minutes(120);
        for _ in 0..3 {
            assert_eq!(q.pop_due(later).unwrap().question, 3);
        }
        assert!(q.pop_due(later).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn pops_in_due_order() {
        let mut q = RepetitionQueue::new(vec![minutes(10)]);
        let t = Instant::now();
        q.schedule(1, t + minutes(3));
        q.schedule(2, t);
        q.schedule(3, t + minutes(1));

        let now = t + minutes(60);
        let order: Vec<usize> = std::iter::from_fn(|| q.pop_due(now))
            .map(|e| e.question)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn equal_due_times_keep_insertion_order() {
        let mut q = RepetitionQueue::new(vec![minutes(5)]);
        let t = Instant::now();
        q.schedule(8, t);
        q.schedule(4, t);
        let now = t + minutes(5);
        assert_eq!(q.pop_due(now).unwrap().question, 8);
        assert_eq!(q.pop_due(now).unwrap().question, 4);
    }

    #[test]
    fn only_elapsed_entries_are_due() {
        let mut q = queue();
        let t = Instant::now();
        q.schedule(0, t);
        assert_eq!(q.pop_due(t + minutes(6)).unwrap().due, t + minutes(5));
        assert!(q.pop_due(t + minutes(6)).is_none());
        assert_eq!(q.next_due(), Some(t + minutes(25)));
    }

    #[test]
    fn restore_returns_entry_to_queue() {
        let mut q = RepetitionQueue::new(vec![minutes(5)]);
        let t = Instant::now();
        q.schedule(2, t);
        let entry = q.pop_due(t + minutes(5)).unwrap();
        assert!(q.is_empty());
        q.restore(entry);
        assert_eq!(q.pop_due(t + minutes(5)), Some(entry));
    }

    #[test]
    fn zero_offsets_are_ignored() {
        let mut q = RepetitionQueue::new(vec![Duration::ZERO, minutes(1)]);
        let t = Instant::now();
        q.schedule(0, t);
        assert_eq!(q.len(), 1);
        assert!(q.pop_due(t).is_none());
    }
}
