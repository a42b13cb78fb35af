#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;

use quiz_server::{
    app_state::AppState,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{user::UserRole, Question, Quiz, QuizAttempt, User},
    repositories::{
        AttemptCompletion, QuestionRepository, QuizAttemptRepository, QuizRepository,
        UserRepository,
    },
};

fn page<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "A user with this username or email already exists.".to_string(),
            ));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn find_all_paginated(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let users = self.users.read().await;
        let mut items: Vec<User> = users.values().cloned().collect();
        items.sort_by(|a, b| a.username.cmp(&b.username));
        Ok((page(&items, offset, limit), items.len() as i64))
    }

    async fn leaderboard(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let users = self.users.read().await;
        let mut items: Vec<User> = users.values().cloned().collect();
        items.sort_by(|a, b| {
            b.aggregate_score
                .cmp(&a.aggregate_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok((page(&items, offset, limit), items.len() as i64))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| {
            u.id != user.id && (u.username == user.username || u.email == user.email)
        }) {
            return Err(AppError::Conflict(
                "A user with this username or email already exists.".to_string(),
            ));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user)
            }
            None => Err(AppError::NotFound(format!(
                "User with id '{}' not found",
                user.id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", id)))
    }

    async fn record_completed_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
        score: u32,
    ) -> AppResult<bool> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", user_id)))?;

        if user.attempt_ids.iter().any(|id| id == attempt_id) {
            return Ok(false);
        }
        user.aggregate_score += i64::from(score);
        user.attempt_ids.push(attempt_id.to_string());
        Ok(true)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: RwLock<HashMap<String, Question>>,
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn find_answer_keys(&self, ids: &[String]) -> AppResult<HashMap<String, String>> {
        let questions = self.questions.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| questions.get(id))
            .map(|q| (q.id.clone(), q.correct_answer.clone()))
            .collect())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Question>, i64)> {
        let questions = self.questions.read().await;
        let mut items: Vec<Question> = questions.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok((page(&items, offset, limit), items.len() as i64))
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        match questions.get_mut(&question.id) {
            Some(existing) => {
                *existing = question.clone();
                Ok(question)
            }
            None => Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question.id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.questions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }
}

#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: RwLock<HashMap<String, Quiz>>,
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes
            .write()
            .await
            .insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn find_containing_question(&self, question_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .filter(|q| q.contains_question(question_id))
            .cloned()
            .collect())
    }

    async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<Quiz> = quizzes.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((page(&items, offset, limit), items.len() as i64))
    }

    async fn freeze(&self, id: &str) -> AppResult<()> {
        match self.quizzes.write().await.get_mut(id) {
            Some(quiz) => {
                quiz.frozen = true;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Quiz with id '{}' not found", id))),
        }
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        match quizzes.get_mut(&quiz.id) {
            Some(existing) if existing.frozen => Err(frozen(&quiz.id)),
            Some(existing) => {
                *existing = quiz.clone();
                Ok(quiz)
            }
            None => Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz.id
            ))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut quizzes = self.quizzes.write().await;
        match quizzes.get(id) {
            Some(existing) if existing.frozen => Err(frozen(id)),
            Some(_) => {
                quizzes.remove(id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Quiz with id '{}' not found", id))),
        }
    }
}

fn frozen(id: &str) -> AppError {
    AppError::Conflict(format!(
        "Quiz '{}' already has attempts and can no longer be changed",
        id
    ))
}

#[derive(Default)]
pub struct InMemoryQuizAttemptRepository {
    attempts: RwLock<HashMap<String, QuizAttempt>>,
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        self.attempts
            .write()
            .await
            .insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn complete_if_open(
        &self,
        id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        // Check and set under one write lock, like the conditional update.
        let mut attempts = self.attempts.write().await;
        let Some(attempt) = attempts.get_mut(id).filter(|a| !a.completed) else {
            return Ok(None);
        };

        attempt.completed = true;
        attempt.score = completion.score;
        attempt.user_answers = completion.user_answers;
        attempt.submitted_at = Some(completion.submitted_at);
        attempt.force_completed = completion.forced;
        attempt.reconciled = false;
        Ok(Some(attempt.clone()))
    }

    async fn mark_reconciled(&self, id: &str) -> AppResult<()> {
        if let Some(attempt) = self.attempts.write().await.get_mut(id) {
            if attempt.completed {
                attempt.reconciled = true;
            }
        }
        Ok(())
    }

    async fn find_unreconciled(&self, limit: i64) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut pending: Vec<QuizAttempt> = attempts
            .values()
            .filter(|a| a.completed && !a.reconciled)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn exists_for_quiz(&self, quiz_id: &str) -> AppResult<bool> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .any(|a| a.quiz_id == quiz_id))
    }

    async fn get_user_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<QuizAttempt> = attempts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok((page(&items, offset, limit), items.len() as i64))
    }
}

pub fn test_config() -> Config {
    Config {
        app_env: "test".to_string(),
        mongo_conn_string: "mongodb://localhost:27017".to_string(),
        mongo_db_name: "quiz-test".to_string(),
        mongo_max_pool_size: 10,
        mongo_min_pool_size: 2,
        mongo_timeout_secs: 5,
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 5000,
        jwt_secret: SecretString::from("integration_test_secret".to_string()),
        jwt_expiration_hours: 1,
        reconcile_interval_secs: 60,
        reconcile_batch_size: 100,
        cors_allowed_origin: "http://localhost:5173".to_string(),
    }
}

/// In-memory repositories plus an `AppState` wired on top of them.
pub struct TestContext {
    pub users: Arc<InMemoryUserRepository>,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub attempts: Arc<InMemoryQuizAttemptRepository>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let questions = Arc::new(InMemoryQuestionRepository::default());
        let quizzes = Arc::new(InMemoryQuizRepository::default());
        let attempts = Arc::new(InMemoryQuizAttemptRepository::default());

        let state = AppState::from_repositories(
            test_config(),
            users.clone(),
            questions.clone(),
            quizzes.clone(),
            attempts.clone(),
        );

        Self {
            users,
            questions,
            quizzes,
            attempts,
            state,
        }
    }

    pub async fn seed_user(&self, username: &str) -> User {
        let user = User::new(username, &format!("{}@example.com", username), "unused-hash");
        self.users.create(user).await.unwrap()
    }

    pub async fn seed_admin(&self, username: &str) -> User {
        let mut user = User::new(username, &format!("{}@example.com", username), "unused-hash");
        user.role = UserRole::Admin;
        self.users.create(user).await.unwrap()
    }

    /// Stores one question per `(text, correct_answer)` and a quiz over them,
    /// in the given order.
    pub async fn seed_quiz(
        &self,
        questions: &[(&str, &str)],
        time_limit_minutes: u32,
    ) -> (Quiz, Vec<Question>) {
        let mut stored = Vec::with_capacity(questions.len());
        for (text, answer) in questions {
            let question = Question::new(
                text,
                vec![answer.to_string(), "Something else".to_string()],
                answer,
                None,
                "admin-id",
            );
            stored.push(self.questions.create(question).await.unwrap());
        }

        let quiz = Quiz::new(
            "Capitals",
            None,
            None,
            stored.iter().map(|q| q.id.clone()).collect(),
            time_limit_minutes,
            "admin-id",
        );
        let quiz = self.quizzes.create(quiz).await.unwrap();
        (quiz, stored)
    }

    /// An open attempt whose clock started at `started_at`.
    pub async fn seed_attempt_started_at(
        &self,
        user: &User,
        quiz: &Quiz,
        started_at: DateTime<Utc>,
    ) -> QuizAttempt {
        let attempt =
            QuizAttempt::start_at(&user.id, &quiz.id, quiz.time_limit_minutes, started_at);
        self.attempts.create(attempt).await.unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt_service.create_token(user).unwrap()
    }

    pub async fn user(&self, id: &str) -> User {
        self.users.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn attempt(&self, id: &str) -> QuizAttempt {
        self.attempts.find_by_id(id).await.unwrap().unwrap()
    }
}

/// Distinct question ids; helper for asserting that answers form a mapping.
pub fn distinct_questions(attempt: &QuizAttempt) -> usize {
    attempt
        .user_answers
        .iter()
        .map(|a| a.question.as_str())
        .collect::<HashSet<_>>()
        .len()
}
