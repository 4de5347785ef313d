//! In-memory analytics and ranking engine.
//!
//! Five independent structures, each operating on plain value objects
//! handed in by the caller:
//!
//! | structure          | used for                                    |
//! |--------------------|---------------------------------------------|
//! | [`PriorityRanker`] | trending polls by votes per hour (min-heap) |
//! | [`PrefixIndex`]    | title prefix search (binary search)         |
//! | [`ActivityLog`]    | bounded recent vote timeline                |
//! | [`ExpiryTracker`]  | polls nearing expiry, FIFO, de-duplicated   |
//! | [`result_sorter`]  | option leaderboards (quicksort)             |
//!
//! Nothing in here performs I/O, logs, or locks. [`ActivityLog`] and
//! [`ExpiryTracker`] hold state across requests; callers that share them
//! must serialize access per operation.

pub mod activity_log;
pub mod error;
pub mod expiry_tracker;
pub mod model;
pub mod prefix_index;
pub mod ranker;
pub mod result_sorter;

pub use activity_log::{ActivityLog, DEFAULT_ACTIVITY_CAPACITY, NewActivity};
pub use error::EngineError;
pub use expiry_tracker::{ExpiryTracker, FifoQueue};
pub use model::{ActivityEvent, ExpiryItem, OptionTally, PollSnapshot};
pub use prefix_index::{PrefixIndex, SearchOutcome};
pub use ranker::{HeapEntry, PriorityRanker, trending_score};
pub use result_sorter::{SortDirection, SortKey, SortedResults};
