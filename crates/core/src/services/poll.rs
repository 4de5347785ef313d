//! Poll service.

use ballot_common::{AppError, AppResult, IdGenerator};
use ballot_db::{
    entities::{poll, poll_option, poll_vote},
    repositories::{PollOptionRepository, PollRepository, PollVoteRepository},
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::analytics::{NewActivity, OptionTally, SortDirection, SortKey, result_sorter};
use crate::services::analytics::SharedActivityLog;

/// Minimum number of non-blank options.
const MIN_OPTIONS: usize = 2;

/// Maximum number of options per poll.
const MAX_OPTIONS: usize = 20;

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub options: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A poll with its options and the caller's vote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetail {
    pub poll: poll::Model,
    pub options: Vec<poll_option::Model>,
    /// Option the caller voted for, if any.
    pub my_vote: Option<String>,
    pub is_expired: bool,
}

/// Vote tallies of a poll, most voted first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll: poll::Model,
    pub total_votes: u64,
    pub options: Vec<OptionTally>,
    pub winner: Option<OptionTally>,
}

/// One entry of a user's voting history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub poll_id: String,
    pub option_id: String,
    pub poll_title: String,
    pub voted_option: String,
    pub created_at: DateTime<Utc>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    vote_repo: PollVoteRepository,
    activity: SharedActivityLog,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        option_repo: PollOptionRepository,
        vote_repo: PollVoteRepository,
        activity: SharedActivityLog,
    ) -> Self {
        Self {
            poll_repo,
            option_repo,
            vote_repo,
            activity,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a poll with its options.
    pub async fn create_poll(&self, user_id: &str, input: CreatePollInput) -> AppResult<PollDetail> {
        input.validate()?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title cannot be blank".to_string()));
        }

        let labels = normalize_options(&input.options)?;

        let now = Utc::now();
        if let Some(expires_at) = input.expires_at
            && expires_at <= now
        {
            return Err(AppError::BadRequest(
                "Expiry must be in the future".to_string(),
            ));
        }

        let poll_id = self.id_gen.generate();
        let model = poll::ActiveModel {
            id: Set(poll_id.clone()),
            title: Set(title),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            created_by: Set(user_id.to_string()),
            expires_at: Set(input.expires_at.map(Into::into)),
            total_votes: Set(0),
            created_at: Set(now.into()),
        };
        let poll = self.poll_repo.create(model).await?;

        let mut options = Vec::with_capacity(labels.len());
        for (position, label) in (0i32..).zip(labels) {
            let option = poll_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll_id.clone()),
                label: Set(label),
                vote_count: Set(0),
                position: Set(position),
            };
            options.push(self.option_repo.create(option).await?);
        }

        info!(poll_id = %poll.id, user_id = %user_id, options = options.len(), "Created poll");

        Ok(PollDetail {
            is_expired: false,
            poll,
            options,
            my_vote: None,
        })
    }

    /// All polls, newest first.
    pub async fn list_polls(&self) -> AppResult<Vec<poll::Model>> {
        self.poll_repo.find_all().await
    }

    /// A poll with its options and, when `user_id` is given, their vote.
    pub async fn get_poll(&self, poll_id: &str, user_id: Option<&str>) -> AppResult<PollDetail> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let options = self.option_repo.find_by_poll(poll_id).await?;

        let my_vote = match user_id {
            Some(uid) => self
                .vote_repo
                .find_by_user_and_poll(uid, poll_id)
                .await?
                .map(|v| v.option_id),
            None => None,
        };

        Ok(PollDetail {
            is_expired: poll.is_expired_at(Utc::now()),
            poll,
            options,
            my_vote,
        })
    }

    /// Delete a poll. Only its creator may do so.
    pub async fn delete_poll(&self, user_id: &str, poll_id: &str) -> AppResult<()> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        if poll.created_by != user_id {
            return Err(AppError::Forbidden(
                "Only the creator can delete this poll".to_string(),
            ));
        }

        if !self.poll_repo.delete(poll_id).await? {
            return Err(AppError::PollNotFound(poll_id.to_string()));
        }

        info!(poll_id = %poll_id, user_id = %user_id, "Deleted poll");
        Ok(())
    }

    /// Cast a vote and record it in the activity log.
    pub async fn vote(
        &self,
        user_id: &str,
        poll_id: &str,
        option_id: &str,
    ) -> AppResult<poll_vote::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;

        let now = Utc::now();
        if poll.is_expired_at(now) {
            return Err(AppError::BadRequest("This poll has expired".to_string()));
        }

        let option = self
            .option_repo
            .find_by_id(option_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Option {option_id}")))?;
        if option.poll_id != poll.id {
            return Err(AppError::BadRequest(
                "Invalid option for this poll".to_string(),
            ));
        }

        if self
            .vote_repo
            .find_by_user_and_poll(user_id, poll_id)
            .await?
            .is_some()
        {
            return Err(already_voted());
        }

        let created = self
            .vote_repo
            .create(poll_vote::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll_id.to_string()),
                option_id: Set(option_id.to_string()),
                user_id: Set(user_id.to_string()),
                created_at: Set(now.into()),
            })
            .await;
        let vote = match created {
            Ok(vote) => vote,
            Err(err) => {
                // A concurrent vote can slip past the check above; the
                // unique index on (poll_id, user_id) then rejects ours.
                if self
                    .vote_repo
                    .find_by_user_and_poll(user_id, poll_id)
                    .await?
                    .is_some()
                {
                    return Err(already_voted());
                }
                return Err(err);
            }
        };

        self.option_repo.increment_vote_count(option_id).await?;
        self.poll_repo.increment_total_votes(poll_id).await?;

        let evicted = self.activity.lock().await.append(NewActivity {
            user_id: user_id.to_string(),
            poll_id: poll.id,
            poll_title: poll.title,
            option_label: option.label,
        });
        if evicted.is_some() {
            debug!("Activity log full, dropped oldest event");
        }

        info!(poll_id = %poll_id, user_id = %user_id, "Vote cast");
        Ok(vote)
    }

    /// Tallies ordered by vote count, with the winner.
    pub async fn results(&self, poll_id: &str) -> AppResult<PollResults> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        let options = self.option_repo.find_by_poll(poll_id).await?;

        let tallies = OptionTally::from_options(&options);
        let total_votes = tallies.iter().map(|t| t.vote_count).sum();
        let sorted = result_sorter::sort(&tallies, SortKey::VoteCount, SortDirection::Desc);

        Ok(PollResults {
            poll,
            total_votes,
            winner: sorted.first().cloned(),
            options: sorted,
        })
    }

    /// A user's voting history, most recent first.
    pub async fn user_votes(&self, user_id: &str) -> AppResult<Vec<VoteRecord>> {
        let votes = self.vote_repo.find_by_user(user_id).await?;

        let mut records = Vec::with_capacity(votes.len());
        for vote in votes {
            let Some(poll) = self.poll_repo.find_by_id(&vote.poll_id).await? else {
                continue;
            };
            let Some(option) = self.option_repo.find_by_id(&vote.option_id).await? else {
                continue;
            };
            records.push(VoteRecord {
                poll_id: vote.poll_id,
                option_id: vote.option_id,
                poll_title: poll.title,
                voted_option: option.label,
                created_at: vote.created_at.with_timezone(&Utc),
            });
        }

        Ok(records)
    }
}

/// Trim option labels, drop blank ones and check the count.
fn normalize_options(raw: &[String]) -> AppResult<Vec<String>> {
    let labels: Vec<String> = raw
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if labels.len() < MIN_OPTIONS {
        return Err(AppError::Validation(format!(
            "Poll must have at least {MIN_OPTIONS} options"
        )));
    }
    if labels.len() > MAX_OPTIONS {
        return Err(AppError::Validation(format!(
            "Poll cannot have more than {MAX_OPTIONS} options"
        )));
    }
    Ok(labels)
}

fn already_voted() -> AppError {
    AppError::Conflict("You have already voted on this poll".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analytics::ActivityLog;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn create_test_poll(id: &str, expires_at: Option<DateTime<Utc>>) -> poll::Model {
        poll::Model {
            id: id.to_string(),
            title: "Best Pizza".to_string(),
            description: None,
            created_by: "creator".to_string(),
            expires_at: expires_at.map(Into::into),
            total_votes: 0,
            created_at: (Utc::now() - Duration::hours(2)).into(),
        }
    }

    fn create_test_option(id: &str, poll_id: &str, label: &str, votes: i32) -> poll_option::Model {
        poll_option::Model {
            id: id.to_string(),
            poll_id: poll_id.to_string(),
            label: label.to_string(),
            vote_count: votes,
            position: 0,
        }
    }

    fn create_test_vote(user_id: &str, poll_id: &str, option_id: &str) -> poll_vote::Model {
        poll_vote::Model {
            id: "v1".to_string(),
            poll_id: poll_id.to_string(),
            option_id: option_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> (PollService, SharedActivityLog) {
        let db = Arc::new(db);
        let activity = Arc::new(Mutex::new(ActivityLog::new(10)));
        let service = PollService::new(
            PollRepository::new(db.clone()),
            PollOptionRepository::new(db.clone()),
            PollVoteRepository::new(db),
            activity.clone(),
        );
        (service, activity)
    }

    fn input(options: &[&str]) -> CreatePollInput {
        CreatePollInput {
            title: "Best Pizza".to_string(),
            description: None,
            options: options.iter().map(ToString::to_string).collect(),
            expires_at: None,
        }
    }

    #[test]
    fn test_normalize_options() {
        let raw: Vec<String> = vec!["  Yes ".into(), "   ".into(), "No".into()];
        assert_eq!(normalize_options(&raw).unwrap(), vec!["Yes", "No"]);

        let raw: Vec<String> = vec!["Only".into(), "".into()];
        assert!(matches!(normalize_options(&raw), Err(AppError::Validation(_))));

        let raw: Vec<String> = (0..=MAX_OPTIONS).map(|i| format!("o{i}")).collect();
        assert!(matches!(normalize_options(&raw), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_poll_rejects_blank_title() {
        let (service, _) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut bad = input(&["a", "b"]);
        bad.title = String::new();

        let result = service.create_poll("u1", bad).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_poll_rejects_past_expiry() {
        let (service, _) = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut bad = input(&["a", "b"]);
        bad.expires_at = Some(Utc::now() - Duration::minutes(1));

        let result = service.create_poll("u1", bad).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_poll() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o1", "p1", "Margherita", 0)]])
            .append_query_results([[create_test_option("o2", "p1", "Pepperoni", 0)]])
            .into_connection();
        let (service, _) = service(db);

        let detail = service
            .create_poll("creator", input(&["Margherita", " Pepperoni "]))
            .await
            .unwrap();

        assert_eq!(detail.poll.id, "p1");
        assert_eq!(detail.options.len(), 2);
        assert!(detail.my_vote.is_none());
    }

    #[tokio::test]
    async fn test_vote_records_activity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o1", "p1", "Margherita", 0)]])
            .append_query_results([Vec::<poll_vote::Model>::new()])
            .append_query_results([[create_test_vote("u1", "p1", "o1")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let (service, activity) = service(db);

        let vote = service.vote("u1", "p1", "o1").await.unwrap();
        assert_eq!(vote.option_id, "o1");

        let log = activity.lock().await;
        let recent = log.recent(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].poll_title, "Best Pizza");
        assert_eq!(recent[0].option_label, "Margherita");
    }

    #[tokio::test]
    async fn test_vote_on_expired_poll() {
        let expired = create_test_poll("p1", Some(Utc::now() - Duration::minutes(5)));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[expired]])
            .into_connection();
        let (service, activity) = service(db);

        let result = service.vote("u1", "p1", "o1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(activity.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_vote_with_foreign_option() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o9", "p2", "Other", 0)]])
            .into_connection();
        let (service, _) = service(db);

        let result = service.vote("u1", "p1", "o9").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_vote_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o1", "p1", "Margherita", 0)]])
            .append_query_results([[create_test_vote("u1", "p1", "o1")]])
            .into_connection();
        let (service, _) = service(db);

        let result = service.vote("u1", "p1", "o1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_vote_lost_to_concurrent_insert_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o1", "p1", "Margherita", 0)]])
            .append_query_results([Vec::<poll_vote::Model>::new()])
            .append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint \"idx_poll_vote_poll_user\""
                    .to_string(),
            )])
            .append_query_results([[create_test_vote("u1", "p1", "o1")]])
            .into_connection();
        let (service, activity) = service(db);

        let result = service.vote("u1", "p1", "o1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(activity.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_vote_insert_failure_without_existing_vote() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[create_test_option("o1", "p1", "Margherita", 0)]])
            .append_query_results([Vec::<poll_vote::Model>::new()])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .append_query_results([Vec::<poll_vote::Model>::new()])
            .into_connection();
        let (service, _) = service(db);

        let result = service.vote("u1", "p1", "o1").await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_delete_poll_requires_creator() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .into_connection();
        let (service, _) = service(db);

        let result = service.delete_poll("someone-else", "p1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_results_sorted_with_winner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_poll("p1", None)]])
            .append_query_results([[
                create_test_option("o1", "p1", "Margherita", 1),
                create_test_option("o2", "p1", "Pepperoni", 3),
            ]])
            .into_connection();
        let (service, _) = service(db);

        let results = service.results("p1").await.unwrap();
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.options[0].label, "Pepperoni");
        assert_eq!(results.options[0].percentage, 75.0);
        assert_eq!(results.winner.unwrap().id, "o2");
    }
}
