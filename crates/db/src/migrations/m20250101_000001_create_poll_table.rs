//! Create poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Poll::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Poll::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Poll::Description).text())
                    .col(ColumnDef::new(Poll::CreatedBy).string_len(32).not_null())
                    .col(ColumnDef::new(Poll::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Poll::TotalVotes).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_by (listing a user's polls)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_created_by")
                    .table(Poll::Table)
                    .col(Poll::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Index: expires_at (expiry sweeps)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_expires_at")
                    .table(Poll::Table)
                    .col(Poll::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Poll {
    Table,
    Id,
    Title,
    Description,
    CreatedBy,
    ExpiresAt,
    TotalVotes,
    CreatedAt,
}
