//! Poll entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// User who created the poll
    #[sea_orm(indexed)]
    pub created_by: String,

    /// When voting closes (null for open-ended polls)
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    /// Number of votes cast across all options
    pub total_votes: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::poll_option::Entity")]
    PollOption,

    #[sea_orm(has_many = "super::poll_vote::Entity")]
    PollVote,
}

impl Related<super::poll_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollOption.def()
    }
}

impl Related<super::poll_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PollVote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether voting on this poll has closed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        self.expires_at.as_ref().is_some_and(|exp| *exp <= now)
    }
}
