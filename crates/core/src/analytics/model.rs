//! Value objects consumed and produced by the engine.

#![allow(missing_docs)]

use ballot_db::entities::{poll, poll_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub total_votes: u64,
}

impl PollSnapshot {
    /// Snapshot of an open-ended poll with no votes yet.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at,
            expires_at: None,
            total_votes: 0,
        }
    }

    #[must_use]
    pub fn with_votes(mut self, total_votes: u64) -> Self {
        self.total_votes = total_votes;
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

impl From<&poll::Model> for PollSnapshot {
    fn from(model: &poll::Model) -> Self {
        Self {
            id: model.id.clone(),
            title: model.title.clone(),
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.map(|e| e.with_timezone(&Utc)),
            total_votes: u64::try_from(model.total_votes).unwrap_or(0),
        }
    }
}

/// Vote tally of a single poll option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub id: String,
    pub label: String,
    pub vote_count: u64,
    /// Share of the poll's votes, 0-100, one decimal place.
    pub percentage: f64,
}

impl OptionTally {
    /// Build a tally, deriving the percentage from the poll total.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        vote_count: u64,
        total_votes: u64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            vote_count,
            percentage: percentage_of(vote_count, total_votes),
        }
    }

    /// Tallies for a poll's options; the total is the sum of their counts.
    #[must_use]
    pub fn from_options(options: &[poll_option::Model]) -> Vec<Self> {
        let counts: Vec<u64> = options
            .iter()
            .map(|o| u64::try_from(o.vote_count).unwrap_or(0))
            .collect();
        let total: u64 = counts.iter().sum();

        options
            .iter()
            .zip(counts)
            .map(|(o, count)| Self::new(o.id.clone(), o.label.clone(), count, total))
            .collect()
    }
}

/// `count / total * 100` rounded to one decimal; 0 when `total` is 0.
#[must_use]
pub fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// A recorded vote, as kept by the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub user_id: String,
    pub poll_id: String,
    pub poll_title: String,
    pub option_label: String,
    pub timestamp: DateTime<Utc>,
}

/// A poll waiting in the expiry queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryItem {
    pub poll_id: String,
    pub title: String,
    pub expires_at: DateTime<Utc>,
    pub queued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage_of(1, 3), 33.3);
        assert_eq!(percentage_of(2, 3), 66.7);
        assert_eq!(percentage_of(5, 0), 0.0);
        assert_eq!(percentage_of(4, 4), 100.0);
    }

    #[test]
    fn test_tallies_from_options() {
        let options = vec![
            poll_option::Model {
                id: "o1".to_string(),
                poll_id: "p1".to_string(),
                label: "Yes".to_string(),
                vote_count: 3,
                position: 0,
            },
            poll_option::Model {
                id: "o2".to_string(),
                poll_id: "p1".to_string(),
                label: "No".to_string(),
                vote_count: 1,
                position: 1,
            },
        ];

        let tallies = OptionTally::from_options(&options);
        assert_eq!(tallies[0].percentage, 75.0);
        assert_eq!(tallies[1].percentage, 25.0);
        assert_eq!(tallies[1].label, "No");
    }
}
