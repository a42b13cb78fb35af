use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Question, Quiz},
        dto::{
            request::{CreateQuizRequest, UpdateQuizRequest},
            response::PublicQuizDto,
        },
    },
    repositories::{
        quiz_repository::frozen_conflict, QuestionRepository, QuizAttemptRepository,
        QuizRepository,
    },
};

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            repository,
            questions,
            attempts,
        }
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        let quiz = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))?;

        Ok(quiz)
    }

    /// Quiz with its questions in quiz order, correct answers stripped.
    pub async fn get_public_quiz(&self, id: &str) -> AppResult<PublicQuizDto> {
        let quiz = self.get_quiz(id).await?;
        let mut questions = self.questions.find_by_ids(&quiz.question_ids).await?;
        questions.sort_by_key(|q| {
            quiz.question_ids
                .iter()
                .position(|id| id == &q.id)
                .unwrap_or(usize::MAX)
        });
        Ok(PublicQuizDto::new(quiz, questions))
    }

    pub async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
        self.repository.list_quizzes(offset, limit).await
    }

    pub async fn create_quiz(&self, request: CreateQuizRequest, created_by: &str) -> AppResult<Quiz> {
        request.validate()?;
        self.ensure_questions_exist(&request.question_ids).await?;

        let quiz = Quiz::new(
            &request.title,
            request.description,
            request.category,
            request.question_ids,
            request.time_limit_minutes,
            created_by,
        );

        let quiz = self.repository.create(quiz).await?;
        log::info!("Quiz {} created by {}", quiz.id, created_by);
        Ok(quiz)
    }

    pub async fn update_quiz(&self, id: &str, request: UpdateQuizRequest) -> AppResult<Quiz> {
        request.validate()?;

        let mut quiz = self.get_quiz(id).await?;
        self.ensure_not_attempted(&quiz).await?;

        if let Some(question_ids) = request.question_ids {
            self.ensure_questions_exist(&question_ids).await?;
            quiz.question_ids = question_ids;
        }
        if let Some(title) = request.title {
            quiz.title = title;
        }
        if let Some(description) = request.description {
            quiz.description = Some(description);
        }
        if let Some(category) = request.category {
            quiz.category = Some(category);
        }
        if let Some(time_limit) = request.time_limit_minutes {
            quiz.time_limit_minutes = time_limit;
        }
        quiz.modified_at = Some(Utc::now());

        self.repository.update(quiz).await
    }

    pub async fn delete_quiz(&self, id: &str) -> AppResult<Quiz> {
        let quiz = self.get_quiz(id).await?;
        self.ensure_not_attempted(&quiz).await?;

        self.repository.delete(id).await?;
        log::info!("Quiz {} deleted", id);
        Ok(quiz)
    }

    /// Quizzes are frozen once anyone has started them; attempts snapshot the
    /// time limit but are scored against the live question list. The
    /// repository write re-checks the flag, so an attempt that starts after
    /// this check still wins.
    async fn ensure_not_attempted(&self, quiz: &Quiz) -> AppResult<()> {
        if quiz.frozen || self.attempts.exists_for_quiz(&quiz.id).await? {
            return Err(frozen_conflict(&quiz.id));
        }
        Ok(())
    }

    async fn ensure_questions_exist(&self, question_ids: &[String]) -> AppResult<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = question_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(AppError::ValidationError(format!(
                "Question '{}' is listed more than once.",
                dup
            )));
        }

        let found: Vec<Question> = self.questions.find_by_ids(question_ids).await?;
        let found_ids: HashSet<&str> = found.iter().map(|q| q.id.as_str()).collect();
        let missing: Vec<&str> = question_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found_ids.contains(id))
            .collect();

        if !missing.is_empty() {
            return Err(AppError::ValidationError(format!(
                "One or more provided question IDs do not exist: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
