use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> AppResult<Option<User>>;
    async fn find_all_paginated(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)>;
    /// Users ordered by aggregate score, highest first; ties by username.
    async fn leaderboard(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)>;
    /// Replaces the stored user. Duplicate username or email is `Conflict`.
    async fn update(&self, user: User) -> AppResult<User>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    /// Adds `score` to the aggregate and appends `attempt_id`, once per
    /// attempt. Returns `false` when the attempt was already recorded.
    async fn record_completed_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
        score: u32,
    ) -> AppResult<bool>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

/// Matches the user only while `attempt_id` is not yet recorded, which
/// makes replays of the aggregate update no-ops.
pub(crate) fn unrecorded_attempt_filter(user_id: &str, attempt_id: &str) -> Document {
    doc! { "id": user_id, "attempt_ids": { "$ne": attempt_id } }
}

pub(crate) fn record_attempt_update(
    attempt_id: &str,
    score: u32,
    at: DateTime<Utc>,
) -> AppResult<Document> {
    Ok(doc! {
        "$inc": { "mohsens": i64::from(score) },
        "$push": { "attempt_ids": attempt_id },
        "$set": { "modified_at": to_bson(&at)? },
    })
}

pub(crate) fn leaderboard_sort() -> Document {
    doc! { "mohsens": -1, "username": 1 }
}

fn duplicate_user() -> AppError {
    AppError::Conflict("Account with this username or email already exists.".to_string())
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("users");
        Self { collection }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        self.collection.insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                duplicate_user()
            } else {
                AppError::from(e)
            }
        })?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = self.collection.find_one(doc! { "id": id }).await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "username": username })
            .await?;
        Ok(user)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AppResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "$or": [ { "username": username }, { "email": email } ] })
            .await?;
        Ok(user)
    }

    async fn find_all_paginated(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let total = self.collection.count_documents(doc! {}).await? as i64;

        let users = self
            .collection
            .find(doc! {})
            .sort(doc! { "username": 1 })
            .skip(offset as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((users, total))
    }

    async fn leaderboard(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let total = self.collection.count_documents(doc! {}).await? as i64;

        let users = self
            .collection
            .find(doc! {})
            .sort(leaderboard_sort())
            .skip(offset as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((users, total))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let result = self
            .collection
            .replace_one(doc! { "id": &user.id }, &user)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    duplicate_user()
                } else {
                    AppError::from(e)
                }
            })?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "User with id '{}' not found",
                user.id
            )));
        }

        Ok(user)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!("User with id '{}' not found", id)));
        }

        Ok(())
    }

    async fn record_completed_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
        score: u32,
    ) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                unrecorded_attempt_filter(user_id, attempt_id),
                record_attempt_update(attempt_id, score, Utc::now())?,
            )
            .await?;

        if result.matched_count == 1 {
            return Ok(true);
        }

        match self.find_by_id(user_id).await? {
            Some(_) => Ok(false),
            None => Err(AppError::NotFound(format!(
                "User with id '{}' not found",
                user_id
            ))),
        }
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for users collection");

        let unique = |field: &str| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(format!("{}_unique", field))
                        .build(),
                )
                .build()
        };

        self.collection.create_index(unique("id")).await?;
        self.collection.create_index(unique("username")).await?;
        self.collection.create_index(unique("email")).await?;

        log::info!("Successfully created indexes for users collection");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
