use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::domain::{quiz_attempt::UserAnswer, user::UserRole};

static USERNAME_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("USERNAME_REGEX is a valid regex pattern")
});

fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_id").with_message("Invalid ID format.".into()))
}

fn validate_uuid_list(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|value| validate_uuid(value))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 50),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits, '_', '.' and '-'"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Admin edit of an account. Absent fields are left as they are; a new
/// password is re-hashed before it is stored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 3, max = 50),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits, '_', '.' and '-'"
        )
    )]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: Option<String>,

    pub role: Option<UserRole>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub options: Vec<String>,

    pub correct_answer: String,

    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: Option<String>,

    #[validate(length(max = 20))]
    pub options: Option<Vec<String>>,

    pub correct_answer: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: u32,

    #[validate(
        length(min = 1, message = "A quiz needs at least one question."),
        custom(function = "validate_uuid_list")
    )]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: Option<u32>,

    #[validate(length(min = 1), custom(function = "validate_uuid_list"))]
    pub question_ids: Option<Vec<String>>,
}

/// One `(question, answer)` pair. `answer` is optional at the serde level so
/// an absent field surfaces as a validation error rather than a parse error;
/// an empty string is a legitimate answer.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct UserAnswerInput {
    #[validate(custom(function = "validate_uuid"))]
    pub question: String,

    #[validate(required(message = "Answer field must be present for each question."))]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "user_answers must be a non-empty array."),
        nested
    )]
    pub user_answers: Vec<UserAnswerInput>,
}

impl SubmitAnswersRequest {
    /// Converts validated input into domain answers. Call after `validate()`.
    pub fn into_answers(self) -> Vec<UserAnswer> {
        self.user_answers
            .into_iter()
            .map(|input| UserAnswer {
                question: input.question,
                answer: input.answer.unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
