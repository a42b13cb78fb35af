use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{question::AnswerKey, Question},
};

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> AppResult<Question>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>>;
    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>>;
    /// Single batched lookup of authoritative answers, keyed by question id.
    /// Ids with no stored question are simply absent from the map.
    async fn find_answer_keys(&self, ids: &[String]) -> AppResult<HashMap<String, String>>;
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Question>, i64)>;
    async fn update(&self, question: Question) -> AppResult<Question>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("questions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for questions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;

        log::info!("Successfully created indexes for questions collection");
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let question = self.collection.find_one(doc! { "id": id }).await?;
        Ok(question)
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let questions = self
            .collection
            .find(doc! { "id": { "$in": to_bson(ids)? } })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn find_answer_keys(&self, ids: &[String]) -> AppResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let keys: Vec<AnswerKey> = self
            .collection
            .clone_with_type::<AnswerKey>()
            .find(doc! { "id": { "$in": to_bson(ids)? } })
            .projection(doc! { "_id": 0, "id": 1, "correct_answer": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(keys
            .into_iter()
            .map(|key| (key.id, key.correct_answer))
            .collect())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Question>, i64)> {
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

    async fn update(&self, question: Question) -> AppResult<Question> {
        let result = self
            .collection
            .replace_one(doc! { "id": &question.id }, &question)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question.id
            )));
        }

        Ok(question)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
