//! Create `poll_vote` table.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_poll_table::Poll;
use super::m20250101_000002_create_poll_option_table::PollOption;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PollVote::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::OptionId).string_len(32).not_null())
                    .col(ColumnDef::new(PollVote::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PollVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_poll")
                            .from(PollVote::Table, PollVote::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_vote_option")
                            .from(PollVote::Table, PollVote::OptionId)
                            .to(PollOption::Table, PollOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per user per poll
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_poll_user")
                    .table(PollVote::Table)
                    .col(PollVote::PollId)
                    .col(PollVote::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (vote history)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_vote_user_id")
                    .table(PollVote::Table)
                    .col(PollVote::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollVote::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PollVote {
    Table,
    Id,
    PollId,
    OptionId,
    UserId,
    CreatedAt,
}
