use crate::{
    auth::Claims,
    models::domain::{Question, Quiz, User},
};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn test_question(text: &str, correct_answer: &str) -> Question {
        Question::new(
            text,
            vec![correct_answer.to_string(), "Other".to_string()],
            correct_answer,
            Some("general".to_string()),
            "admin-id",
        )
    }

    /// A quiz over `questions`, in the given order.
    pub fn test_quiz(questions: &[Question], time_limit_minutes: u32) -> Quiz {
        Quiz::new(
            "Capitals",
            Some("European capitals".to_string()),
            Some("geography".to_string()),
            questions.iter().map(|q| q.id.clone()).collect(),
            time_limit_minutes,
            "admin-id",
        )
    }

    pub fn user_claims(username: &str) -> Claims {
        Claims::new(&User::test_user(username), 1)
    }

    pub fn admin_claims(username: &str) -> Claims {
        Claims::new(&User::test_admin(username), 1)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_quiz_keeps_question_order() {
        let q1 = test_question("Capital of France?", "Paris");
        let q2 = test_question("Capital of Italy?", "Rome");
        let quiz = test_quiz(&[q2.clone(), q1.clone()], 10);

        assert_eq!(quiz.question_ids, vec![q2.id, q1.id]);
        assert_eq!(quiz.time_limit_minutes, 10);
    }

    #[test]
    fn test_fixtures_claims_carry_role() {
        assert!(!user_claims("alice").is_admin());
        assert!(admin_claims("root").is_admin());
    }
}
