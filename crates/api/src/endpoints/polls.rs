//! Poll endpoints.

use axum::{Json, Router, extract::State, routing::post};
use ballot_common::AppResult;
use ballot_core::{CreatePollInput, PollDetail, PollResults, VoteRecord};
use ballot_db::entities::{poll, poll_vote};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Largest page the list endpoint returns.
const MAX_LIST_LIMIT: usize = 100;

/// List polls request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPollsRequest {
    pub limit: Option<usize>,
}

/// Request naming a single poll.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollIdRequest {
    pub poll_id: String,
}

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub poll_id: String,
    pub option_id: String,
}

/// List polls, newest first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListPollsRequest>,
) -> AppResult<ApiResponse<Vec<poll::Model>>> {
    let limit = req.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let mut polls = state.poll_service.list_polls().await?;
    polls.truncate(limit);

    Ok(ApiResponse::ok(polls))
}

/// Get a poll with its options.
async fn show(
    MaybeAuthUser(user_id): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollDetail>> {
    let detail = state
        .poll_service
        .get_poll(&req.poll_id, user_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(detail))
}

/// Create a poll.
async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePollInput>,
) -> AppResult<ApiResponse<PollDetail>> {
    let detail = state.poll_service.create_poll(&user_id, req).await?;

    Ok(ApiResponse::ok(detail))
}

/// Delete a poll.
async fn delete(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.poll_service.delete_poll(&user_id, &req.poll_id).await?;

    Ok(ApiResponse::ok(()))
}

/// Vote on a poll.
async fn vote(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<poll_vote::Model>> {
    let vote = state
        .poll_service
        .vote(&user_id, &req.poll_id, &req.option_id)
        .await?;

    Ok(ApiResponse::ok(vote))
}

/// Vote tallies of a poll.
async fn results(
    State(state): State<AppState>,
    Json(req): Json<PollIdRequest>,
) -> AppResult<ApiResponse<PollResults>> {
    let results = state.poll_service.results(&req.poll_id).await?;

    Ok(ApiResponse::ok(results))
}

/// The caller's voting history.
async fn my_votes(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VoteRecord>>> {
    let votes = state.poll_service.user_votes(&user_id).await?;

    Ok(ApiResponse::ok(votes))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/vote", post(vote))
        .route("/results", post(results))
        .route("/my-votes", post(my_votes))
}
