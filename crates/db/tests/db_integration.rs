//! Database layer integration tests.
//!
//! These run against `sea_orm::MockDatabase`; no `PostgreSQL` instance is needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ballot_db::entities::{poll, poll_option, poll_vote};
use ballot_db::migrations::Migrator;
use ballot_db::repositories::{PollOptionRepository, PollRepository, PollVoteRepository};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use sea_orm_migration::{MigrationName, MigratorTrait};

fn option(id: &str, poll_id: &str, label: &str, position: i32) -> poll_option::Model {
    poll_option::Model {
        id: id.to_string(),
        poll_id: poll_id.to_string(),
        label: label.to_string(),
        vote_count: 0,
        position,
    }
}

#[test]
fn test_migrations_are_ordered() {
    let names: Vec<String> = Migrator::migrations()
        .iter()
        .map(|m| m.name().to_string())
        .collect();

    assert_eq!(
        names,
        vec![
            "m20250101_000001_create_poll_table",
            "m20250101_000002_create_poll_option_table",
            "m20250101_000003_create_poll_vote_table",
        ]
    );
}

#[tokio::test]
async fn test_find_expiring_returns_rows() {
    let soon = poll::Model {
        id: "p1".to_string(),
        title: "Lunch spot".to_string(),
        description: None,
        created_by: "u1".to_string(),
        expires_at: Some((Utc::now() + Duration::minutes(30)).into()),
        total_votes: 3,
        created_at: Utc::now().into(),
    };

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[soon]])
            .into_connection(),
    );

    let polls = PollRepository::new(db).find_expiring(Utc::now()).await.unwrap();
    assert_eq!(polls.len(), 1);
    assert!(!polls[0].is_expired_at(Utc::now()));
}

#[tokio::test]
async fn test_options_in_position_order() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                option("o1", "p1", "Tacos", 0),
                option("o2", "p1", "Sushi", 1),
            ]])
            .into_connection(),
    );

    let options = PollOptionRepository::new(db).find_by_poll("p1").await.unwrap();
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Tacos", "Sushi"]);
}

#[tokio::test]
async fn test_increment_vote_count() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection(),
    );

    let result = PollOptionRepository::new(db).increment_vote_count("o1").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_find_vote_by_user_and_poll() {
    let vote = poll_vote::Model {
        id: "v1".to_string(),
        poll_id: "p1".to_string(),
        option_id: "o2".to_string(),
        user_id: "u1".to_string(),
        created_at: Utc::now().into(),
    };

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[vote]])
            .into_connection(),
    );

    let found = PollVoteRepository::new(db)
        .find_by_user_and_poll("u1", "p1")
        .await
        .unwrap();
    assert_eq!(found.map(|v| v.option_id), Some("o2".to_string()));
}
