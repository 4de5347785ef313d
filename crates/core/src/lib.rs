//! Core business logic for ballot.
//!
//! - [`analytics`]: the in-memory ranking and analytics engine. Pure,
//!   synchronous data structures fed with snapshots supplied by the caller.
//! - [`services`]: poll lifecycle and analytics services that read from the
//!   database and drive the engine.

pub mod analytics;
pub mod services;

pub use analytics::{
    ActivityEvent, ActivityLog, EngineError, ExpiryItem, ExpiryTracker, FifoQueue, HeapEntry,
    OptionTally, PollSnapshot, PrefixIndex, PriorityRanker, SortDirection, SortKey,
    SortedResults,
};
pub use services::*;
