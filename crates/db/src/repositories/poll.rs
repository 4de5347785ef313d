//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, PollVote, poll, poll_vote};
use ballot_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// All polls, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Polls that have an expiry still in the future, soonest first.
    pub async fn find_expiring(&self, now: DateTime<Utc>) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::ExpiresAt.is_not_null())
            .filter(poll::Column::ExpiresAt.gt(now))
            .order_by_asc(poll::Column::ExpiresAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a poll.
    pub async fn update(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump the denormalized vote total by one.
    pub async fn increment_total_votes(&self, id: &str) -> AppResult<()> {
        Poll::update_many()
            .col_expr(
                poll::Column::TotalVotes,
                Expr::col(poll::Column::TotalVotes).add(1),
            )
            .filter(poll::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a poll. Returns `false` when no row matched.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Poll vote repository for database operations.
#[derive(Clone)]
pub struct PollVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl PollVoteRepository {
    /// Create a new poll vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's vote on a poll.
    pub async fn find_by_user_and_poll(
        &self,
        user_id: &str,
        poll_id: &str,
    ) -> AppResult<Option<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::UserId.eq(user_id))
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if user has voted on a poll.
    pub async fn has_voted(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        let count = PollVote::find()
            .filter(poll_vote::Column::UserId.eq(user_id))
            .filter(poll_vote::Column::PollId.eq(poll_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// A user's votes, most recent first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<poll_vote::Model>> {
        PollVote::find()
            .filter(poll_vote::Column::UserId.eq(user_id))
            .order_by_desc(poll_vote::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new vote.
    pub async fn create(&self, model: poll_vote::ActiveModel) -> AppResult<poll_vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
