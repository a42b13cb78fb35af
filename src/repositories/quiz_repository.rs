use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Quiz,
};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn find_containing_question(&self, question_id: &str) -> AppResult<Vec<Quiz>>;
    async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)>;
    /// Marks the quiz as attempted. Idempotent.
    async fn freeze(&self, id: &str) -> AppResult<()>;
    /// Replaces an unfrozen quiz; `Conflict` if it has been frozen meanwhile.
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    /// Deletes an unfrozen quiz; `Conflict` if it has been frozen meanwhile.
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Matches the quiz only while no attempt has frozen it. Documents written
/// before the flag existed have no `frozen` field and still match.
pub(crate) fn unfrozen_quiz_filter(id: &str) -> Document {
    doc! { "id": id, "frozen": { "$ne": true } }
}

pub(crate) fn frozen_conflict(id: &str) -> AppError {
    AppError::Conflict(format!(
        "Quiz '{}' already has attempts and can no longer be changed",
        id
    ))
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    /// Distinguishes a missing quiz from a frozen one after a filtered write
    /// matched nothing.
    async fn missing_or_frozen(&self, id: &str) -> AppResult<AppError> {
        Ok(match self.find_by_id(id).await? {
            Some(_) => frozen_conflict(id),
            None => AppError::NotFound(format!("Quiz with id '{}' not found", id)),
        })
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let question_index = IndexModel::builder()
            .keys(doc! { "question_ids": 1 })
            .options(
                IndexOptions::builder()
                    .name("question_ids".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(question_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn find_containing_question(&self, question_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .collection
            .find(doc! { "question_ids": question_id })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
        let total = self.collection.count_documents(doc! {}).await? as i64;

        let items = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .skip(offset as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }

    async fn freeze(&self, id: &str) -> AppResult<()> {
        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": { "frozen": true } })
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Quiz with id '{}' not found", id)));
        }

        Ok(())
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(unfrozen_quiz_filter(&quiz.id), &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(self.missing_or_frozen(&quiz.id).await?);
        }

        Ok(quiz)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.collection.delete_one(unfrozen_quiz_filter(id)).await?;

        if result.deleted_count == 0 {
            return Err(self.missing_or_frozen(id).await?);
        }

        Ok(())
    }
}
