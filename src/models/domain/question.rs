use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>, // Empty for free-text questions
    pub correct_answer: String,
    pub category: Option<String>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(
        text: &str,
        options: Vec<String>,
        correct_answer: &str,
        category: Option<String>,
        created_by: &str,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            options,
            correct_answer: correct_answer.to_string(),
            category,
            created_by: created_by.to_string(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn is_free_text(&self) -> bool {
        self.options.is_empty()
    }
}

/// Authoritative answer for one question, as loaded by the scorer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerKey {
    pub id: String,
    pub correct_answer: String,
}
