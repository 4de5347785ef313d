//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use ballot_core::{AnalyticsService, PollService};
use tracing::debug;

/// Header carrying the caller's id, set by the upstream auth gate.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Longest accepted caller id.
const MAX_USER_ID_LEN: usize = 32;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub poll_service: PollService,
    pub analytics_service: AnalyticsService,
}

/// Identity of the caller, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

/// Authentication middleware.
///
/// Token checks happen upstream; this only lifts a well-formed
/// `x-user-id` header into the request extensions.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    if let Some(value) = req.headers().get(USER_ID_HEADER)
        && let Ok(raw) = value.to_str()
    {
        let user_id = raw.trim();
        if !user_id.is_empty() && user_id.len() <= MAX_USER_ID_LEN {
            let caller = CallerId(user_id.to_string());
            req.extensions_mut().insert(caller);
        } else {
            debug!("Ignoring malformed user id header");
        }
    }

    next.run(req).await
}
