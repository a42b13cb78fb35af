use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{quiz_attempt::UserAnswer, QuizAttempt},
};

/// Terminal state written onto an open attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptCompletion {
    pub user_answers: Vec<UserAnswer>,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
    pub forced: bool,
}

impl AttemptCompletion {
    pub fn scored(user_answers: Vec<UserAnswer>, score: u32, submitted_at: DateTime<Utc>) -> Self {
        Self {
            user_answers,
            score,
            submitted_at,
            forced: false,
        }
    }

    /// Deadline expiry: nothing was accepted, so nothing is scored.
    pub fn forced(submitted_at: DateTime<Utc>) -> Self {
        Self {
            user_answers: Vec::new(),
            score: 0,
            submitted_at,
            forced: true,
        }
    }
}

/// Matches the attempt only while it is still open. This filter is the
/// check-and-set behind at-most-once scoring: a concurrent winner makes it
/// match nothing.
pub(crate) fn open_attempt_filter(id: &str) -> Document {
    doc! { "id": id, "completed": false }
}

/// `$set` that closes an attempt and queues it for reconciliation.
pub(crate) fn completion_update(completion: &AttemptCompletion) -> AppResult<Document> {
    Ok(doc! {
        "$set": {
            "completed": true,
            "score": i64::from(completion.score),
            "user_answers": to_bson(&completion.user_answers)?,
            "submitted_at": to_bson(&completion.submitted_at)?,
            "force_completed": completion.forced,
            "reconciled": false,
        }
    })
}

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;
    /// Atomically applies `completion` only if the attempt is still open.
    /// Returns the updated attempt, or `None` when no open attempt matched
    /// (missing, or already completed by another writer).
    async fn complete_if_open(
        &self,
        id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>>;
    async fn mark_reconciled(&self, id: &str) -> AppResult<()>;
    async fn find_unreconciled(&self, limit: i64) -> AppResult<Vec<QuizAttempt>>;
    async fn exists_for_quiz(&self, quiz_id: &str) -> AppResult<bool>;
    async fn get_user_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_id_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "started_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_started".to_string())
                    .build(),
            )
            .build();

        let quiz_id_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1 })
            .options(IndexOptions::builder().name("quiz_id".to_string()).build())
            .build();

        let reconcile_index = IndexModel::builder()
            .keys(doc! { "completed": 1, "reconciled": 1 })
            .options(
                IndexOptions::builder()
                    .name("completed_reconciled".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_id_index).await?;
        self.collection.create_index(quiz_id_index).await?;
        self.collection.create_index(reconcile_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn complete_if_open(
        &self,
        id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        let attempt = self
            .collection
            .find_one_and_update(open_attempt_filter(id), completion_update(&completion)?)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(attempt)
    }

    async fn mark_reconciled(&self, id: &str) -> AppResult<()> {
        self.collection
            .update_one(
                doc! { "id": id, "completed": true },
                doc! { "$set": { "reconciled": true } },
            )
            .await?;
        Ok(())
    }

    async fn find_unreconciled(&self, limit: i64) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "completed": true, "reconciled": { "$ne": true } })
            .sort(doc! { "submitted_at": 1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn exists_for_quiz(&self, quiz_id: &str) -> AppResult<bool> {
        let attempt = self.collection.find_one(doc! { "quiz_id": quiz_id }).await?;
        Ok(attempt.is_some())
    }

    async fn get_user_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)> {
        let filter = doc! { "user_id": user_id };

        let total = self.collection.count_documents(filter.clone()).await?;

        let attempts = self
            .collection
            .find(filter)
            .skip(offset as u64)
            .limit(limit)
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;

        Ok((attempts, total as i64))
    }
}
