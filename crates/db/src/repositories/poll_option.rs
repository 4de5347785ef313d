//! Poll option repository.

use std::sync::Arc;

use crate::entities::{PollOption, poll_option};
use ballot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// Poll option repository for database operations.
#[derive(Clone)]
pub struct PollOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PollOptionRepository {
    /// Create a new poll option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an option by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll_option::Model>> {
        PollOption::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Options of a poll in display order.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new option.
    pub async fn create(&self, model: poll_option::ActiveModel) -> AppResult<poll_option::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an option.
    pub async fn update(&self, model: poll_option::ActiveModel) -> AppResult<poll_option::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump an option's vote count by one.
    pub async fn increment_vote_count(&self, id: &str) -> AppResult<()> {
        PollOption::update_many()
            .col_expr(
                poll_option::Column::VoteCount,
                Expr::col(poll_option::Column::VoteCount).add(1),
            )
            .filter(poll_option::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
