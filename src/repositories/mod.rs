pub mod question_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod user_repository;

pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use quiz_attempt_repository::{AttemptCompletion, MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
