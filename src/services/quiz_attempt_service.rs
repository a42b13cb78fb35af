use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    auth::{require_owner_or_admin, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{quiz_attempt::UserAnswer, Question, Quiz, QuizAttempt},
        dto::{request::SubmitAnswersRequest, response::PublicQuizDto},
    },
    repositories::{AttemptCompletion, QuestionRepository, QuizAttemptRepository, QuizRepository},
    services::{grading, reconciliation_service::ReconciliationService},
};

/// A freshly opened attempt plus the quiz to render, answers stripped.
#[derive(Debug, Clone)]
pub struct StartedAttempt {
    pub attempt: QuizAttempt,
    pub quiz: PublicQuizDto,
}

/// Output of the submission guard: an open, owned, on-time attempt.
#[derive(Debug, Clone)]
pub struct ValidatedAttempt {
    pub attempt: QuizAttempt,
    pub quiz: Quiz,
    pub answers: Vec<UserAnswer>,
}

pub struct QuizAttemptService {
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    reconciler: Arc<ReconciliationService>,
}

impl QuizAttemptService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        reconciler: Arc<ReconciliationService>,
    ) -> Self {
        Self {
            quizzes,
            questions,
            attempts,
            reconciler,
        }
    }

    pub async fn start_attempt(&self, quiz_id: &str, user_id: &str) -> AppResult<StartedAttempt> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))?;

        let questions = self.load_questions_in_order(&quiz).await?;

        // Freeze before the attempt exists so no admin edit can land after it.
        self.quizzes.freeze(&quiz.id).await?;

        let attempt = self
            .attempts
            .create(QuizAttempt::start(user_id, &quiz.id, quiz.time_limit_minutes))
            .await?;

        log::info!(
            "User {} started attempt {} on quiz {} ({} min)",
            user_id,
            attempt.id,
            quiz.id,
            attempt.time_limit_minutes
        );

        Ok(StartedAttempt {
            attempt,
            quiz: PublicQuizDto::new(quiz, questions),
        })
    }

    /// Preconditions for scoring. Every rejection leaves the attempt untouched
    /// except `DeadlineExceeded`, which force-completes it first.
    pub async fn validate_submission(
        &self,
        attempt_id: &str,
        user_id: &str,
        request: SubmitAnswersRequest,
    ) -> AppResult<ValidatedAttempt> {
        request.validate()?;
        let answers = request.into_answers();
        grading::ensure_distinct_questions(&answers)?;

        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;

        if !attempt.is_owned_by(user_id) {
            log::warn!(
                "User {} tried to submit attempt {} owned by {}",
                user_id,
                attempt.id,
                attempt.user_id
            );
            return Err(AppError::Forbidden(
                "This attempt belongs to another user".to_string(),
            ));
        }

        if attempt.completed {
            return Err(already_submitted());
        }

        let now = Utc::now();
        if attempt.is_expired_at(now) {
            return Err(self.force_complete(&attempt).await);
        }

        let quiz = self
            .quizzes
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Quiz with id '{}' not found", attempt.quiz_id))
            })?;

        Ok(ValidatedAttempt {
            attempt,
            quiz,
            answers,
        })
    }

    pub async fn score_and_finalize(&self, validated: ValidatedAttempt) -> AppResult<QuizAttempt> {
        let ValidatedAttempt {
            attempt,
            quiz,
            answers,
        } = validated;

        let lookup_ids = grading::scorable_question_ids(&quiz, &answers);
        let keys = self.questions.find_answer_keys(&lookup_ids).await?;
        let score = grading::grade_answers(&quiz, &answers, &keys);

        let submitted_at = Utc::now().max(attempt.started_at);
        let finalized = self
            .attempts
            .complete_if_open(
                &attempt.id,
                AttemptCompletion::scored(answers, score, submitted_at),
            )
            .await?
            .ok_or_else(|| {
                log::info!("Attempt {} lost a concurrent submission race", attempt.id);
                already_submitted()
            })?;

        log::info!(
            "Attempt {} scored {}/{} for user {}",
            finalized.id,
            finalized.score,
            quiz.question_count(),
            finalized.user_id
        );

        self.update_owner_aggregate(&finalized).await;

        Ok(finalized)
    }

    pub async fn submit(
        &self,
        attempt_id: &str,
        user_id: &str,
        request: SubmitAnswersRequest,
    ) -> AppResult<QuizAttempt> {
        let validated = self.validate_submission(attempt_id, user_id, request).await?;
        self.score_and_finalize(validated).await
    }

    pub async fn get_attempt(&self, attempt_id: &str, claims: &Claims) -> AppResult<QuizAttempt> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id))
            })?;

        require_owner_or_admin(claims, &attempt.user_id)?;
        Ok(attempt)
    }

    pub async fn list_user_attempts(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, i64)> {
        self.attempts.get_user_attempts(user_id, offset, limit).await
    }

    /// Returns the error to surface: `DeadlineExceeded` normally, `Conflict`
    /// if another request completed the attempt first.
    async fn force_complete(&self, attempt: &QuizAttempt) -> AppError {
        let completion = AttemptCompletion::forced(Utc::now().max(attempt.started_at));

        match self.attempts.complete_if_open(&attempt.id, completion).await {
            Ok(Some(forced)) => {
                log::info!(
                    "Attempt {} force-completed after deadline {}",
                    forced.id,
                    forced.deadline()
                );
                self.update_owner_aggregate(&forced).await;
                AppError::DeadlineExceeded(
                    "Time is up! This quiz can no longer be submitted.".to_string(),
                )
            }
            Ok(None) => already_submitted(),
            Err(e) => e,
        }
    }

    /// Best effort: the attempt is already final. A failure here is reported
    /// and left for the reconciliation job.
    async fn update_owner_aggregate(&self, attempt: &QuizAttempt) {
        if let Err(e) = self.reconciler.reconcile(attempt).await {
            log::error!(
                "Aggregate score for user {} diverges from attempt {} (score {}): {}",
                attempt.user_id,
                attempt.id,
                attempt.score,
                e
            );
        }
    }

    async fn load_questions_in_order(&self, quiz: &Quiz) -> AppResult<Vec<Question>> {
        let mut found = self.questions.find_by_ids(&quiz.question_ids).await?;

        let mut ordered = Vec::with_capacity(quiz.question_ids.len());
        for id in &quiz.question_ids {
            match found.iter().position(|q| &q.id == id) {
                Some(index) => ordered.push(found.swap_remove(index)),
                None => log::warn!("Quiz {} references missing question {}", quiz.id, id),
            }
        }

        Ok(ordered)
    }
}

fn already_submitted() -> AppError {
    AppError::Conflict("This quiz has already been submitted.".to_string())
}
