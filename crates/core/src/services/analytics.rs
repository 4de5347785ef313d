//! Analytics service.
//!
//! Reads poll snapshots through the repositories and runs them through the
//! in-memory engine. The activity log and expiry tracker live for the whole
//! process and are shared behind async mutexes; every operation takes the
//! lock once and holds it until the structure is consistent again.

use std::sync::Arc;

use ballot_common::{AnalyticsConfig, AppResult};
use ballot_db::repositories::{PollOptionRepository, PollRepository};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::analytics::{
    ActivityEvent, ActivityLog, ExpiryItem, ExpiryTracker, OptionTally, PollSnapshot,
    PriorityRanker, SortedResults, prefix_index::{self, SearchOutcome}, result_sorter,
};

/// Process-wide activity log.
pub type SharedActivityLog = Arc<Mutex<ActivityLog>>;

/// Process-wide expiry tracker.
pub type SharedExpiryTracker = Arc<Mutex<ExpiryTracker>>;

/// A trending poll with its velocity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    pub poll: PollSnapshot,
    pub votes_per_hour: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingReport {
    pub trending: Vec<TrendingEntry>,
    pub heap_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    /// Oldest of the window first.
    pub activities: Vec<ActivityEvent>,
    pub count: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryReport {
    pub expiring_polls: Vec<ExpiryItem>,
    pub queue_size: usize,
    pub processed: usize,
    pub checked_within_minutes: i64,
}

/// Sorted option tallies of one poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub poll: PollSnapshot,
    pub total_votes: u64,
    #[serde(flatten)]
    pub sorted: SortedResults,
}

/// Catalogue entry describing one engine structure.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureInfo {
    pub name: &'static str,
    pub used_for: &'static str,
    pub endpoint: &'static str,
    pub time_complexity: &'static [(&'static str, &'static str)],
    pub space_complexity: &'static str,
}

const STRUCTURES: [StructureInfo; 5] = [
    StructureInfo {
        name: "Min-heap (priority queue)",
        used_for: "Trending polls ranked by votes per hour",
        endpoint: "/analytics/trending",
        time_complexity: &[("insert", "O(log n)"), ("extractMin", "O(log n)"), ("peek", "O(1)")],
        space_complexity: "O(n)",
    },
    StructureInfo {
        name: "Binary search",
        used_for: "Poll search by title prefix",
        endpoint: "/analytics/search",
        time_complexity: &[("search", "O(log n + k)"), ("sort", "O(n log n)")],
        space_complexity: "O(n)",
    },
    StructureInfo {
        name: "Bounded ring buffer",
        used_for: "Recent vote activity feed",
        endpoint: "/analytics/activity",
        time_complexity: &[("append", "O(1)"), ("recent", "O(k)")],
        space_complexity: "O(capacity)",
    },
    StructureInfo {
        name: "FIFO queue",
        used_for: "Processing polls nearing expiry in order",
        endpoint: "/analytics/expiry-queue",
        time_complexity: &[("enqueue", "O(1)"), ("dequeue", "O(1)"), ("sweep", "O(n)")],
        space_complexity: "O(n)",
    },
    StructureInfo {
        name: "Quicksort (median-of-three)",
        used_for: "Poll results sorted by votes, percentage or label",
        endpoint: "/analytics/results",
        time_complexity: &[("average", "O(n log n)"), ("worst", "O(n^2)")],
        space_complexity: "O(n)",
    },
];

/// Service driving the analytics engine.
#[derive(Clone)]
pub struct AnalyticsService {
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    activity: SharedActivityLog,
    expiry: SharedExpiryTracker,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        option_repo: PollOptionRepository,
        activity: SharedActivityLog,
        expiry: SharedExpiryTracker,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            poll_repo,
            option_repo,
            activity,
            expiry,
            config,
        }
    }

    async fn snapshots(&self) -> AppResult<Vec<PollSnapshot>> {
        let polls = self.poll_repo.find_all().await?;
        Ok(polls.iter().map(PollSnapshot::from).collect())
    }

    /// Fastest-moving polls, most votes per hour first.
    pub async fn trending(&self, limit: Option<usize>) -> AppResult<TrendingReport> {
        let limit = limit.unwrap_or(self.config.trending_limit);
        let ranker = PriorityRanker::from_snapshots(&self.snapshots().await?, Utc::now());

        let trending = ranker
            .top_n(limit)
            .into_iter()
            .map(|entry| TrendingEntry {
                votes_per_hour: entry.votes_per_hour(),
                poll: entry.poll,
            })
            .collect();

        Ok(TrendingReport {
            trending,
            heap_size: ranker.len(),
        })
    }

    /// Polls whose title starts with `query`. A blank query matches all.
    pub async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
        let outcome = prefix_index::search(&self.snapshots().await?, query);
        debug!(query = %query, found = outcome.total_found, "Prefix search");
        Ok(outcome)
    }

    /// The newest `limit` vote events, oldest of them first.
    pub async fn recent_activity(&self, limit: Option<usize>) -> ActivityReport {
        let limit = limit.unwrap_or(self.config.activity_limit);
        let log = self.activity.lock().await;
        let activities = log.recent(limit);

        ActivityReport {
            count: activities.len(),
            capacity: log.capacity(),
            activities,
        }
    }

    /// Queue polls expiring within `within_minutes` and report the queue.
    pub async fn sweep_expiring(&self, within_minutes: Option<i64>) -> AppResult<ExpiryReport> {
        let within = within_minutes
            .filter(|m| *m > 0)
            .unwrap_or(self.config.expiry_window_minutes);

        let now = Utc::now();
        let polls: Vec<PollSnapshot> = self
            .poll_repo
            .find_expiring(now)
            .await?
            .iter()
            .map(PollSnapshot::from)
            .collect();

        let mut tracker = self.expiry.lock().await;
        let before = tracker.len();
        let queue_size = tracker.sweep_at(&polls, within, now);
        if queue_size > before {
            info!(added = queue_size - before, queue_size, "Queued expiring polls");
        }

        Ok(ExpiryReport {
            expiring_polls: tracker.items(),
            queue_size,
            processed: tracker.processed_count(),
            checked_within_minutes: within,
        })
    }

    /// Take the next poll off the expiry queue.
    pub async fn process_next_expiring(&self) -> AppResult<ExpiryItem> {
        let item = self.expiry.lock().await.dequeue_next()?;
        info!(poll_id = %item.poll_id, "Processed expiring poll");
        Ok(item)
    }

    /// Option tallies of a poll sorted by the named key and direction.
    ///
    /// Unknown keys sort by vote count; anything but `asc` sorts descending.
    pub async fn sorted_results(
        &self,
        poll_id: &str,
        sort_by: &str,
        order: &str,
    ) -> AppResult<Leaderboard> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let options = self.option_repo.find_by_poll(poll_id).await?;

        let tallies = OptionTally::from_options(&options);
        let total_votes = tallies.iter().map(|t| t.vote_count).sum();

        Ok(Leaderboard {
            poll: PollSnapshot::from(&poll),
            total_votes,
            sorted: result_sorter::sort_results(&tallies, sort_by, order),
        })
    }

    /// Static description of the engine structures.
    #[must_use]
    pub const fn describe() -> &'static [StructureInfo] {
        &STRUCTURES
    }
}
