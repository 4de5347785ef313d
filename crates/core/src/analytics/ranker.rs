//! Trending ranker backed by a binary min-heap.
//!
//! Polls are keyed by the negated vote velocity (votes per hour), so the
//! heap's minimum is the fastest-moving poll.
//!
//! Layout is the usual implicit tree over a `Vec`:
//! parent of `i` is `(i - 1) / 2`, children are `2i + 1` and `2i + 2`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::EngineError;
use super::model::PollSnapshot;

/// Polls younger than this are scored as if they were exactly this old.
pub const MIN_AGE_HOURS: f64 = 1.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Negated votes per hour of `poll` as seen at `now`.
///
/// Lower is more trending. Age is floored at [`MIN_AGE_HOURS`].
#[must_use]
pub fn trending_score(poll: &PollSnapshot, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - poll.created_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    -(poll.total_votes as f64 / age_hours.max(MIN_AGE_HOURS))
}

/// A poll together with its heap key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapEntry {
    /// The ranked poll.
    pub poll: PollSnapshot,
    /// Heap key, see [`trending_score`].
    pub score: f64,
}

impl HeapEntry {
    /// Score `poll` at `now`.
    #[must_use]
    pub fn new(poll: PollSnapshot, now: DateTime<Utc>) -> Self {
        let score = trending_score(&poll, now);
        Self { poll, score }
    }

    /// Human-facing velocity: the score negated back.
    #[must_use]
    pub fn votes_per_hour(&self) -> f64 {
        -self.score
    }
}

/// Min-heap of [`HeapEntry`] ordered by `score`.
#[derive(Debug, Clone, Default)]
pub struct PriorityRanker {
    heap: Vec<HeapEntry>,
}

impl PriorityRanker {
    /// Create an empty ranker.
    #[must_use]
    pub const fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Score every snapshot at `now` and heapify them in O(n).
    #[must_use]
    pub fn from_snapshots(snapshots: &[PollSnapshot], now: DateTime<Utc>) -> Self {
        Self::build_from(
            snapshots
                .iter()
                .map(|p| HeapEntry::new(p.clone(), now))
                .collect(),
        )
    }

    /// Bottom-up heap construction: sink every internal node, last first.
    #[must_use]
    pub fn build_from(entries: Vec<HeapEntry>) -> Self {
        let mut ranker = Self { heap: entries };
        for i in (0..ranker.heap.len() / 2).rev() {
            ranker.sink_down(i);
        }
        ranker
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Raw heap array, root first.
    #[must_use]
    pub fn as_slice(&self) -> &[HeapEntry] {
        &self.heap
    }

    /// Add an entry. O(log n).
    pub fn insert(&mut self, entry: HeapEntry) {
        self.heap.push(entry);
        self.bubble_up(self.heap.len() - 1);
    }

    /// Remove and return the lowest-scored entry. O(log n).
    pub fn extract_min(&mut self) -> Result<HeapEntry, EngineError> {
        if self.heap.is_empty() {
            return Err(EngineError::Empty("priority ranker"));
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let min = self.heap.pop().ok_or(EngineError::Empty("priority ranker"))?;
        self.sink_down(0);
        Ok(min)
    }

    /// The lowest-scored entry without removing it. O(1).
    pub fn peek(&self) -> Result<&HeapEntry, EngineError> {
        self.heap.first().ok_or(EngineError::Empty("priority ranker"))
    }

    /// Up to `n` entries in ascending score order.
    ///
    /// Works on a copy; the live heap is left untouched.
    #[must_use]
    pub fn top_n(&self, n: usize) -> Vec<HeapEntry> {
        let mut scratch = self.clone();
        let mut out = Vec::with_capacity(n.min(self.heap.len()));
        while out.len() < n {
            match scratch.extract_min() {
                Ok(entry) => out.push(entry),
                Err(_) => break,
            }
        }
        out
    }

    fn bubble_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[parent].score <= self.heap[index].score {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
    }

    fn sink_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.heap[left].score < self.heap[smallest].score {
                smallest = left;
            }
            if right < len && self.heap[right].score < self.heap[smallest].score {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(smallest, index);
            index = smallest;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(id: &str, hours_old: i64, votes: u64, now: DateTime<Utc>) -> PollSnapshot {
        PollSnapshot::new(id, format!("Poll {id}"), now - Duration::hours(hours_old))
            .with_votes(votes)
    }

    fn entry(score: f64) -> HeapEntry {
        HeapEntry {
            poll: PollSnapshot::new(format!("p{score}"), "t", Utc::now()),
            score,
        }
    }

    fn assert_heap_property(ranker: &PriorityRanker) {
        let heap = ranker.as_slice();
        for i in 0..heap.len() {
            for child in [2 * i + 1, 2 * i + 2] {
                if child < heap.len() {
                    assert!(
                        heap[i].score <= heap[child].score,
                        "parent {i} ({}) > child {child} ({})",
                        heap[i].score,
                        heap[child].score
                    );
                }
            }
        }
    }

    #[test]
    fn test_trending_score_velocity() {
        let now = Utc::now();
        assert_eq!(trending_score(&poll("a", 2, 20, now), now), -10.0);
        assert_eq!(trending_score(&poll("b", 10, 15, now), now), -1.5);
    }

    #[test]
    fn test_fresh_poll_treated_as_one_hour_old() {
        let now = Utc::now();
        let fresh = PollSnapshot::new("f", "Fresh", now - Duration::minutes(5)).with_votes(7);
        assert_eq!(trending_score(&fresh, now), -7.0);

        let entry = HeapEntry::new(fresh, now);
        assert_eq!(entry.votes_per_hour(), 7.0);
    }

    #[test]
    fn test_faster_poll_ranks_first() {
        let now = Utc::now();
        let ranker =
            PriorityRanker::from_snapshots(&[poll("P2", 10, 15, now), poll("P1", 2, 20, now)], now);

        let top = ranker.top_n(2);
        assert_eq!(top[0].poll.id, "P1");
        assert_eq!(top[1].poll.id, "P2");
    }

    #[test]
    fn test_heap_property_after_mixed_operations() {
        let mut ranker = PriorityRanker::new();
        for score in [5.0, -3.0, 8.0, 0.0, -10.0, 2.5, 2.5, -1.0, 7.0] {
            ranker.insert(entry(score));
            assert_heap_property(&ranker);
        }
        ranker.extract_min().unwrap();
        assert_heap_property(&ranker);
        ranker.insert(entry(-20.0));
        ranker.extract_min().unwrap();
        ranker.extract_min().unwrap();
        assert_heap_property(&ranker);
    }

    #[test]
    fn test_extract_until_empty_is_non_decreasing() {
        let mut ranker = PriorityRanker::build_from(
            [3.0, -4.0, 9.0, -4.0, 0.5, 12.0, -7.5, 1.0]
                .into_iter()
                .map(entry)
                .collect(),
        );
        assert_heap_property(&ranker);

        let mut scores = Vec::new();
        while let Ok(e) = ranker.extract_min() {
            scores.push(e.score);
        }
        assert_eq!(scores.len(), 8);
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_top_n_does_not_mutate() {
        let ranker = PriorityRanker::build_from(vec![entry(1.0), entry(-2.0), entry(0.0)]);

        let first = ranker.top_n(2);
        let second = ranker.top_n(2);
        assert_eq!(first, second);
        assert_eq!(ranker.len(), 3);
        assert_eq!(ranker.peek().unwrap().score, -2.0);
    }

    #[test]
    fn test_top_n_larger_than_heap() {
        let ranker = PriorityRanker::build_from(vec![entry(1.0), entry(-2.0)]);
        assert_eq!(ranker.top_n(10).len(), 2);
        assert!(ranker.top_n(0).is_empty());
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut ranker = PriorityRanker::new();
        assert_eq!(
            ranker.extract_min().unwrap_err(),
            EngineError::Empty("priority ranker")
        );
        assert!(ranker.peek().is_err());
        assert!(ranker.is_empty());
    }
}
