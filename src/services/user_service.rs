use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::password::hash_password,
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::{
            request::UpdateUserRequest,
            response::{LeaderboardEntryDto, UserDto},
        },
    },
    repositories::UserRepository,
};

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    async fn find_user(&self, id: &str) -> AppResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", id)))
    }

    pub async fn get_user(&self, id: &str) -> AppResult<UserDto> {
        Ok(UserDto::from(self.find_user(id).await?))
    }

    pub async fn get_all_users_paginated(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<UserDto>, i64)> {
        let (users, total) = self.repository.find_all_paginated(offset, limit).await?;
        Ok((users.into_iter().map(UserDto::from).collect(), total))
    }

    /// Usernames and aggregate scores only, best first.
    pub async fn leaderboard(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<LeaderboardEntryDto>, i64)> {
        let (users, total) = self.repository.leaderboard(offset, limit).await?;
        Ok((
            users.into_iter().map(LeaderboardEntryDto::from).collect(),
            total,
        ))
    }

    /// Aggregate score and attempt history are never editable here; they
    /// only move through attempt completion.
    pub async fn update_user(&self, id: &str, request: UpdateUserRequest) -> AppResult<UserDto> {
        request.validate()?;
        if request.is_empty() {
            return Err(AppError::ValidationError(
                "Provide at least one of username, email, password or role.".to_string(),
            ));
        }

        let mut user = self.find_user(id).await?;

        if let Some(username) = request.username {
            user.username = username.trim().to_lowercase();
        }
        if let Some(email) = request.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(password) = request.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        user.modified_at = Some(Utc::now());

        let user = self.repository.update(user).await?;
        log::info!("User {} updated", user.id);
        Ok(UserDto::from(user))
    }

    /// Completed attempts stay behind; reconciliation skips them.
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        self.repository.delete(id).await?;
        log::info!("User {} deleted", id);
        Ok(())
    }
}
