use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub started_at: DateTime<Utc>,
    pub time_limit_minutes: u32, // Snapshot of the quiz at start
    pub user_answers: Vec<UserAnswer>,
    pub completed: bool,
    pub score: u32,
    #[serde(default)]
    pub force_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Whether the owner's aggregate score has absorbed this attempt.
    #[serde(default)]
    pub reconciled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserAnswer {
    pub question: String,
    pub answer: String,
}

impl QuizAttempt {
    pub fn start(user_id: &str, quiz_id: &str, time_limit_minutes: u32) -> Self {
        Self::start_at(user_id, quiz_id, time_limit_minutes, Utc::now())
    }

    pub fn start_at(
        user_id: &str,
        quiz_id: &str,
        time_limit_minutes: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            started_at,
            time_limit_minutes,
            user_answers: Vec::new(),
            completed: false,
            score: 0,
            force_completed: false,
            submitted_at: None,
            reconciled: false,
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(i64::from(self.time_limit_minutes))
    }

    /// Reaching the deadline exactly is still on time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attempt_is_open_with_zero_score() {
        let attempt = QuizAttempt::start("user-1", "quiz-1", 10);

        assert!(!attempt.completed);
        assert!(!attempt.reconciled);
        assert_eq!(attempt.score, 0);
        assert!(attempt.user_answers.is_empty());
        assert!(attempt.submitted_at.is_none());
        assert!(attempt.is_owned_by("user-1"));
        assert!(!attempt.is_owned_by("user-2"));
    }

    #[test]
    fn deadline_is_start_plus_time_limit() {
        let start = Utc::now();
        let attempt = QuizAttempt::start_at("user-1", "quiz-1", 10, start);

        assert_eq!(attempt.deadline(), start + Duration::minutes(10));
        assert!(!attempt.is_expired_at(start + Duration::seconds(599)));
        assert!(!attempt.is_expired_at(start + Duration::minutes(10)));
        assert!(attempt.is_expired_at(start + Duration::seconds(601)));
    }

    #[test]
    fn legacy_documents_without_saga_fields_deserialize() {
        let json = serde_json::json!({
            "id": "a-1",
            "user_id": "u-1",
            "quiz_id": "q-1",
            "started_at": "2024-05-01T10:00:00Z",
            "time_limit_minutes": 5,
            "user_answers": [],
            "completed": false,
            "score": 0
        });

        let attempt: QuizAttempt = serde_json::from_value(json).expect("attempt should parse");
        assert!(!attempt.force_completed);
        assert!(!attempt.reconciled);
    }
}
