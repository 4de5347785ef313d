//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod poll;

pub use analytics::{
    ActivityReport, AnalyticsService, ExpiryReport, Leaderboard, SharedActivityLog,
    SharedExpiryTracker, StructureInfo, TrendingEntry, TrendingReport,
};
pub use poll::{CreatePollInput, PollDetail, PollResults, PollService, VoteRecord};
