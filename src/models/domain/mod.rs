pub mod question;
pub mod quiz;
pub mod quiz_attempt;
pub mod user;
pub use question::Question;
pub use quiz::Quiz;
pub use quiz_attempt::QuizAttempt;
pub use user::User;
