//! Engine error type.

use ballot_common::AppError;
use thiserror::Error;

/// Errors raised by the analytics structures.
///
/// Only underflow is an error; "no match" outcomes are ordinary return
/// values (`None`, empty slices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Extract or dequeue attempted on an empty structure.
    #[error("{0} is empty")]
    Empty(&'static str),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self::NotFound(err.to_string())
    }
}
