use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    quiz_attempt::UserAnswer,
    user::UserRole,
    Question, Quiz, QuizAttempt, User,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub mohsens: i64,
    pub attempt_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            mohsens: user.aggregate_score,
            attempt_ids: user.attempt_ids,
            created_at: user.created_at,
        }
    }
}

/// Public leaderboard row: no id, email or attempt history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntryDto {
    pub username: String,
    pub mohsens: i64,
}

impl From<User> for LeaderboardEntryDto {
    fn from(user: User) -> Self {
        LeaderboardEntryDto {
            username: user.username,
            mohsens: user.aggregate_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

/// Question as shown to quiz takers. Deliberately has no answer field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicQuestionDto {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<Question> for PublicQuestionDto {
    fn from(question: Question) -> Self {
        PublicQuestionDto {
            id: question.id,
            text: question.text,
            options: question.options,
            category: question.category,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizSummaryDto {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub time_limit_minutes: u32,
    pub question_count: usize,
    pub created_by: String,
}

impl From<Quiz> for QuizSummaryDto {
    fn from(quiz: Quiz) -> Self {
        QuizSummaryDto {
            question_count: quiz.question_count(),
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            time_limit_minutes: quiz.time_limit_minutes,
            created_by: quiz.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizDto {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub time_limit_minutes: u32,
    pub questions: Vec<PublicQuestionDto>,
}

impl PublicQuizDto {
    /// `questions` must already be in quiz order.
    pub fn new(quiz: Quiz, questions: Vec<Question>) -> Self {
        PublicQuizDto {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            time_limit_minutes: quiz.time_limit_minutes,
            questions: questions.into_iter().map(PublicQuestionDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptDto {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub time_limit_minutes: u32,
    pub user_answers: Vec<UserAnswer>,
    pub completed: bool,
    pub score: u32,
    pub force_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<QuizAttempt> for AttemptDto {
    fn from(attempt: QuizAttempt) -> Self {
        AttemptDto {
            deadline: attempt.deadline(),
            id: attempt.id,
            user_id: attempt.user_id,
            quiz_id: attempt.quiz_id,
            started_at: attempt.started_at,
            time_limit_minutes: attempt.time_limit_minutes,
            user_answers: attempt.user_answers,
            completed: attempt.completed,
            score: attempt.score,
            force_completed: attempt.force_completed,
            submitted_at: attempt.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedAttemptDto {
    pub attempt: AttemptDto,
    pub quiz: PublicQuizDto,
}
