use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::Question,
        dto::request::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    repositories::{QuestionRepository, QuizAttemptRepository, QuizRepository},
};

pub struct QuestionService {
    repository: Arc<dyn QuestionRepository>,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl QuestionService {
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            repository,
            quizzes,
            attempts,
        }
    }

    pub async fn get_question(&self, id: &str) -> AppResult<Question> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }

    pub async fn list_questions(&self, offset: i64, limit: i64) -> AppResult<(Vec<Question>, i64)> {
        self.repository.list(offset, limit).await
    }

    pub async fn create_question(
        &self,
        request: CreateQuestionRequest,
        created_by: &str,
    ) -> AppResult<Question> {
        request.validate()?;
        ensure_answer_is_an_option(&request.options, &request.correct_answer)?;

        let question = Question::new(
            &request.text,
            request.options,
            &request.correct_answer,
            request.category,
            created_by,
        );

        let question = self.repository.create(question).await?;
        log::info!("Question {} created by {}", question.id, created_by);
        Ok(question)
    }

    pub async fn update_question(
        &self,
        id: &str,
        request: UpdateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;

        let mut question = self.get_question(id).await?;
        self.ensure_not_in_attempted_quiz(id).await?;

        if let Some(text) = request.text {
            question.text = text;
        }
        if let Some(options) = request.options {
            question.options = options;
        }
        if let Some(correct_answer) = request.correct_answer {
            question.correct_answer = correct_answer;
        }
        if let Some(category) = request.category {
            question.category = Some(category);
        }
        if !question.is_free_text() {
            ensure_answer_is_an_option(&question.options, &question.correct_answer)?;
        }
        question.modified_at = Some(Utc::now());

        self.repository.update(question).await
    }

    pub async fn delete_question(&self, id: &str) -> AppResult<Question> {
        let question = self.get_question(id).await?;

        let referencing = self.quizzes.find_containing_question(id).await?;
        if let Some(quiz) = referencing.first() {
            return Err(AppError::Conflict(format!(
                "Question '{}' is used by quiz '{}'",
                id, quiz.id
            )));
        }

        self.repository.delete(id).await?;
        log::info!("Question {} deleted", id);
        Ok(question)
    }

    async fn ensure_not_in_attempted_quiz(&self, question_id: &str) -> AppResult<()> {
        for quiz in self.quizzes.find_containing_question(question_id).await? {
            if quiz.frozen || self.attempts.exists_for_quiz(&quiz.id).await? {
                return Err(AppError::Conflict(format!(
                    "Question '{}' belongs to quiz '{}' which already has attempts",
                    question_id, quiz.id
                )));
            }
        }
        Ok(())
    }
}

fn ensure_answer_is_an_option(options: &[String], correct_answer: &str) -> AppResult<()> {
    if !options.is_empty() && !options.iter().any(|o| o == correct_answer) {
        return Err(AppError::ValidationError(
            "correct_answer must be one of the options".to_string(),
        ));
    }
    Ok(())
}
