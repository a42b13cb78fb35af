pub mod auth_service;
pub mod grading;
pub mod question_service;
pub mod quiz_attempt_service;
pub mod quiz_service;
pub mod reconciliation_service;
pub mod user_service;
