//! Data access repositories.

mod poll;
mod poll_option;

pub use poll::{PollRepository, PollVoteRepository};
pub use poll_option::PollOptionRepository;
