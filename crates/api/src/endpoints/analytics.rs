//! Analytics endpoints.

use axum::{Json, Router, extract::State, routing::post};
use ballot_common::AppResult;
use ballot_core::{
    ActivityReport, AnalyticsService, ExpiryItem, ExpiryReport, Leaderboard, StructureInfo,
    TrendingReport, analytics::SearchOutcome,
};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Request carrying an optional result limit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitRequest {
    pub limit: Option<usize>,
}

/// Prefix search request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

/// Expiry sweep request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryQueueRequest {
    /// Look-ahead window in minutes.
    pub within: Option<i64>,
}

/// Sorted results request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedResultsRequest {
    pub poll_id: String,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub order: String,
}

/// Search response, echoing the query.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub outcome: SearchOutcome,
}

/// Trending polls.
async fn trending(
    State(state): State<AppState>,
    Json(req): Json<LimitRequest>,
) -> AppResult<ApiResponse<TrendingReport>> {
    let report = state.analytics_service.trending(req.limit).await?;

    Ok(ApiResponse::ok(report))
}

/// Polls by title prefix.
async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> AppResult<ApiResponse<SearchResponse>> {
    let outcome = state.analytics_service.search(&req.query).await?;

    Ok(ApiResponse::ok(SearchResponse {
        query: req.query,
        outcome,
    }))
}

/// Recent vote activity.
async fn activity(
    State(state): State<AppState>,
    Json(req): Json<LimitRequest>,
) -> AppResult<ApiResponse<ActivityReport>> {
    let report = state.analytics_service.recent_activity(req.limit).await;

    Ok(ApiResponse::ok(report))
}

/// Sweep for expiring polls and show the queue.
async fn expiry_queue(
    State(state): State<AppState>,
    Json(req): Json<ExpiryQueueRequest>,
) -> AppResult<ApiResponse<ExpiryReport>> {
    let report = state.analytics_service.sweep_expiring(req.within).await?;

    Ok(ApiResponse::ok(report))
}

/// Take the next poll off the expiry queue.
async fn expiry_queue_next(State(state): State<AppState>) -> AppResult<ApiResponse<ExpiryItem>> {
    let item = state.analytics_service.process_next_expiring().await?;

    Ok(ApiResponse::ok(item))
}

/// Option tallies sorted by key and direction.
async fn results(
    State(state): State<AppState>,
    Json(req): Json<SortedResultsRequest>,
) -> AppResult<ApiResponse<Leaderboard>> {
    let board = state
        .analytics_service
        .sorted_results(&req.poll_id, &req.sort_by, &req.order)
        .await?;

    Ok(ApiResponse::ok(board))
}

/// Engine structure catalogue.
async fn info() -> ApiResponse<&'static [StructureInfo]> {
    ApiResponse::ok(AnalyticsService::describe())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trending", post(trending))
        .route("/search", post(search))
        .route("/activity", post(activity))
        .route("/expiry-queue", post(expiry_queue))
        .route("/expiry-queue/next", post(expiry_queue_next))
        .route("/results", post(results))
        .route("/info", post(info))
}
