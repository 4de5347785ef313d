//! Capacity-bounded log of recent vote events.
//!
//! Backed by a `VecDeque` used as a ring buffer: appends go to the back,
//! evictions come off the front, both O(1). The log never holds more than
//! `capacity` events; once full, every append drops the oldest one.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::model::ActivityEvent;

/// Capacity used when none is configured.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

/// A vote to record, before it is timestamped.
#[derive(Debug, Clone)]
pub struct NewActivity {
    /// Voter.
    pub user_id: String,
    /// Poll voted on.
    pub poll_id: String,
    /// Poll title at the time of the vote.
    pub poll_title: String,
    /// Label of the chosen option.
    pub option_label: String,
}

/// Most recent vote events, oldest at the front.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    events: VecDeque<ActivityEvent>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl ActivityLog {
    /// Create an empty log holding at most `capacity` events.
    ///
    /// Storage grows with the events appended, up to `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
        }
    }

    /// Maximum number of retained events.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stamp `activity` with the current time and append it.
    ///
    /// Returns the evicted event when the log was already full.
    pub fn append(&mut self, activity: NewActivity) -> Option<ActivityEvent> {
        self.append_at(activity, Utc::now())
    }

    /// Append `activity` stamped with `timestamp`.
    pub fn append_at(
        &mut self,
        activity: NewActivity,
        timestamp: DateTime<Utc>,
    ) -> Option<ActivityEvent> {
        self.events.push_back(ActivityEvent {
            user_id: activity.user_id,
            poll_id: activity.poll_id,
            poll_title: activity.poll_title,
            option_label: activity.option_label,
            timestamp,
        });

        if self.events.len() > self.capacity {
            self.events.pop_front()
        } else {
            None
        }
    }

    /// Up to `k` newest events, oldest of them first.
    #[must_use]
    pub fn recent(&self, k: usize) -> Vec<ActivityEvent> {
        let mut window: Vec<ActivityEvent> = self.events.iter().rev().take(k).cloned().collect();
        window.reverse();
        window
    }

    /// Events oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter()
    }

    /// Events newest first.
    pub fn iter_rev(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter().rev()
    }

    /// Oldest retained event for `poll_id`.
    #[must_use]
    pub fn find_by_poll(&self, poll_id: &str) -> Option<&ActivityEvent> {
        self.events.iter().find(|e| e.poll_id == poll_id)
    }

    /// Remove and return the oldest event.
    pub fn pop_oldest(&mut self) -> Option<ActivityEvent> {
        self.events.pop_front()
    }

    /// Remove and return the newest event.
    pub fn pop_newest(&mut self) -> Option<ActivityEvent> {
        self.events.pop_back()
    }
}
