use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub question_ids: Vec<String>, // Ordered, as presented to the taker
    pub time_limit_minutes: u32,
    pub created_by: String,
    /// Set when the first attempt starts; writes to a frozen quiz are refused.
    #[serde(default)]
    pub frozen: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(
        title: &str,
        description: Option<String>,
        category: Option<String>,
        question_ids: Vec<String>,
        time_limit_minutes: u32,
        created_by: &str,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description,
            category,
            question_ids,
            time_limit_minutes,
            created_by: created_by.to_string(),
            frozen: false,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    pub fn contains_question(&self, question_id: &str) -> bool {
        self.question_ids.iter().any(|id| id == question_id)
    }
}
