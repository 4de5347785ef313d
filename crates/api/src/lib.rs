//! HTTP API layer for ballot.
//!
//! - **Endpoints**: poll lifecycle, voting and analytics queries
//! - **Extractors**: caller identity taken from the upstream auth gate
//! - **Middleware**: application state and identity propagation
//!
//! Every route is a JSON `POST`, answered with an [`response::ApiResponse`].

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, CallerId, auth_middleware};
