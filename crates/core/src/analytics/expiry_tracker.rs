//! FIFO tracking of polls about to expire.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use super::error::EngineError;
use super::model::{ExpiryItem, PollSnapshot};

/// Dead slots tolerated at the front before the buffer is compacted.
const COMPACT_THRESHOLD: usize = 32;

/// FIFO queue over a growable buffer with a front cursor.
///
/// Dequeue only advances the cursor, so it never shifts the remaining
/// items. The consumed prefix is reclaimed once it outweighs the live
/// items, which keeps both operations amortized O(1).
#[derive(Debug, Clone)]
pub struct FifoQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FifoQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            front: 0,
        }
    }

    /// Add `item` at the back.
    pub fn enqueue(&mut self, item: T) {
        self.slots.push(Some(item));
    }

    /// Remove the front item.
    pub fn dequeue(&mut self) -> Option<T> {
        let item = self.slots.get_mut(self.front)?.take();
        self.front += 1;

        if self.front == self.slots.len() {
            self.slots.clear();
            self.front = 0;
        } else if self.front >= COMPACT_THRESHOLD && self.front * 2 >= self.slots.len() {
            self.slots.drain(..self.front);
            self.front = 0;
        }

        item
    }

    /// The front item without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.slots.get(self.front).and_then(Option::as_ref)
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.front
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queued items front to back, without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots[self.front..].iter().flatten()
    }

    /// Dequeue everything, applying `f` to each item in order.
    pub fn drain_with<R>(&mut self, mut f: impl FnMut(&T) -> R) -> Vec<(T, R)> {
        let mut out = Vec::with_capacity(self.len());
        while let Some(item) = self.dequeue() {
            let result = f(&item);
            out.push((item, result));
        }
        out
    }
}

/// Queue of polls entering their expiry window, each tracked once.
///
/// A poll id is remembered from the moment it is queued; after it is
/// dequeued it moves to the processed set, which is never pruned, so a
/// poll is tracked at most once per tracker.
#[derive(Debug, Clone, Default)]
pub struct ExpiryTracker {
    queue: FifoQueue<ExpiryItem>,
    queued: HashSet<String>,
    processed: HashSet<String>,
}

impl ExpiryTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `poll` unless it has been queued or processed before.
    ///
    /// Polls without an expiry are ignored. Returns whether it was queued.
    pub fn enqueue_if_new(&mut self, poll: &PollSnapshot, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = poll.expires_at else {
            return false;
        };
        if self.processed.contains(&poll.id) || self.queued.contains(&poll.id) {
            return false;
        }

        self.queued.insert(poll.id.clone());
        self.queue.enqueue(ExpiryItem {
            poll_id: poll.id.clone(),
            title: poll.title.clone(),
            expires_at,
            queued_at: now,
        });
        true
    }

    /// Pop the oldest queued item and mark its poll processed.
    pub fn dequeue_next(&mut self) -> Result<ExpiryItem, EngineError> {
        let item = self
            .queue
            .dequeue()
            .ok_or(EngineError::Empty("expiry queue"))?;
        self.queued.remove(&item.poll_id);
        self.processed.insert(item.poll_id.clone());
        Ok(item)
    }

    /// Queue every poll expiring within the next `within_minutes`.
    ///
    /// Returns the queue size afterwards.
    pub fn sweep(&mut self, polls: &[PollSnapshot], within_minutes: i64) -> usize {
        self.sweep_at(polls, within_minutes, Utc::now())
    }

    /// [`sweep`](Self::sweep) as seen at `now`.
    ///
    /// A poll qualifies when `now < expires_at < now + within_minutes`.
    /// A window reaching past the representable range is unbounded.
    pub fn sweep_at(
        &mut self,
        polls: &[PollSnapshot],
        within_minutes: i64,
        now: DateTime<Utc>,
    ) -> usize {
        let cutoff = TimeDelta::try_minutes(within_minutes)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        for poll in polls {
            if let Some(expires_at) = poll.expires_at
                && expires_at > now
                && expires_at < cutoff
            {
                self.enqueue_if_new(poll, now);
            }
        }
        self.queue.len()
    }

    /// The next item to be processed.
    #[must_use]
    pub fn peek(&self) -> Option<&ExpiryItem> {
        self.queue.peek()
    }

    /// Queued items in processing order.
    #[must_use]
    pub fn items(&self) -> Vec<ExpiryItem> {
        self.queue.iter().cloned().collect()
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of polls dequeued so far.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Whether `poll_id` has already been dequeued.
    #[must_use]
    pub fn is_processed(&self, poll_id: &str) -> bool {
        self.processed.contains(poll_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn expiring(id: &str, now: DateTime<Utc>, minutes: i64) -> PollSnapshot {
        PollSnapshot::new(id, format!("Poll {id}"), now - Duration::hours(1))
            .with_expiry(now + Duration::minutes(minutes))
    }

    fn ids(items: &[ExpiryItem]) -> Vec<&str> {
        items.iter().map(|i| i.poll_id.as_str()).collect()
    }

    #[test]
    fn test_fifo_queue_order_and_peek() {
        let mut queue = FifoQueue::new();
        for n in 0..5 {
            queue.enqueue(n);
        }
        assert_eq!(queue.peek(), Some(&0));
        assert_eq!(queue.dequeue(), Some(0));
        assert_eq!(queue.dequeue(), Some(1));
        queue.enqueue(5);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_fifo_queue_compacts_and_resets() {
        let mut queue = FifoQueue::new();
        for n in 0..100 {
            queue.enqueue(n);
        }
        for n in 0..60 {
            assert_eq!(queue.dequeue(), Some(n));
        }
        assert_eq!(queue.len(), 40);
        assert_eq!(queue.peek(), Some(&60));

        while queue.dequeue().is_some() {}
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.peek(), None);
    }

    #[test]
    fn test_fifo_drain_with() {
        let mut queue = FifoQueue::new();
        queue.enqueue("a");
        queue.enqueue("bb");

        let drained = queue.drain_with(|s| s.len());
        assert_eq!(drained, vec![("a", 1), ("bb", 2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sweep_window() {
        let now = Utc::now();
        let polls = vec![
            expiring("soon", now, 30),
            expiring("later", now, 60 * 48),
            expiring("past", now, -5),
            PollSnapshot::new("open", "Open ended", now),
        ];

        let mut tracker = ExpiryTracker::new();
        assert_eq!(tracker.sweep_at(&polls, 1440, now), 1);
        assert_eq!(ids(&tracker.items()), vec!["soon"]);
    }

    #[test]
    fn test_sweep_window_bounds_are_exclusive() {
        let now = Utc::now();
        let within = 60;
        let at = |id: &str, offset: Duration| {
            PollSnapshot::new(id, format!("Poll {id}"), now - Duration::hours(1))
                .with_expiry(now + offset)
        };
        let polls = vec![
            at("at_now", Duration::zero()),
            at("just_after_now", Duration::milliseconds(1)),
            at("just_before_cutoff", Duration::minutes(within) - Duration::milliseconds(1)),
            at("at_cutoff", Duration::minutes(within)),
        ];

        let mut tracker = ExpiryTracker::new();
        assert_eq!(tracker.sweep_at(&polls, within, now), 2);
        assert_eq!(
            ids(&tracker.items()),
            vec!["just_after_now", "just_before_cutoff"]
        );
    }

    #[test]
    fn test_sweep_with_oversized_window_is_unbounded() {
        let now = Utc::now();
        let polls = vec![
            expiring("soon", now, 30),
            expiring("far", now, 60 * 24 * 365 * 50),
            expiring("past", now, -5),
        ];

        let mut tracker = ExpiryTracker::new();
        assert_eq!(tracker.sweep_at(&polls, i64::MAX, now), 2);

        let mut tracker = ExpiryTracker::new();
        assert_eq!(tracker.sweep_at(&polls, 100_000_000_000_000, now), 2);
        assert_eq!(ids(&tracker.items()), vec!["soon", "far"]);
    }

    #[test]
    fn test_repeated_sweeps_do_not_duplicate() {
        let now = Utc::now();
        let polls = vec![expiring("a", now, 10), expiring("b", now, 20)];

        let mut tracker = ExpiryTracker::new();
        assert_eq!(tracker.sweep_at(&polls, 60, now), 2);
        assert_eq!(tracker.sweep_at(&polls, 60, now), 2);
        assert_eq!(ids(&tracker.items()), vec!["a", "b"]);

        // processed polls are never re-queued either
        tracker.dequeue_next().unwrap();
        assert_eq!(tracker.sweep_at(&polls, 60, now), 1);
        assert!(tracker.is_processed("a"));
        assert_eq!(tracker.processed_count(), 1);
    }

    #[test]
    fn test_dequeue_is_fifo() {
        let now = Utc::now();
        let mut tracker = ExpiryTracker::new();
        for id in ["x", "y", "z"] {
            assert!(tracker.enqueue_if_new(&expiring(id, now, 5), now));
        }

        let order: Vec<String> = (0..3)
            .map(|_| tracker.dequeue_next().unwrap().poll_id)
            .collect();
        assert_eq!(order, vec!["x", "y", "z"]);
        assert_eq!(
            tracker.dequeue_next().unwrap_err(),
            EngineError::Empty("expiry queue")
        );
    }

    #[test]
    fn test_enqueue_ignores_open_ended_polls() {
        let now = Utc::now();
        let mut tracker = ExpiryTracker::new();
        assert!(!tracker.enqueue_if_new(&PollSnapshot::new("p", "Open", now), now));
        assert!(tracker.is_empty());
        assert!(tracker.peek().is_none());
    }
}
