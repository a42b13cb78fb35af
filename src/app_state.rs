use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoQuestionRepository, MongoQuizAttemptRepository, MongoQuizRepository,
        MongoUserRepository, QuestionRepository, QuizAttemptRepository, QuizRepository,
        UserRepository,
    },
    services::{
        auth_service::AuthService, question_service::QuestionService,
        quiz_attempt_service::QuizAttemptService, quiz_service::QuizService,
        reconciliation_service::ReconciliationService, user_service::UserService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub question_service: Arc<QuestionService>,
    pub quiz_service: Arc<QuizService>,
    pub attempt_service: Arc<QuizAttemptService>,
    pub reconciliation_service: Arc<ReconciliationService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
    /// `None` when running on non-Mongo repositories; readiness then reports
    /// unavailable.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let user_repository = Arc::new(MongoUserRepository::new(&db));
        user_repository.ensure_indexes().await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let quiz_repository = Arc::new(MongoQuizRepository::new(&db));
        quiz_repository.ensure_indexes().await?;

        let attempt_repository = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempt_repository.ensure_indexes().await?;

        let mut state = Self::from_repositories(
            config,
            user_repository,
            question_repository,
            quiz_repository,
            attempt_repository,
        );
        state.db = Some(db);
        Ok(state)
    }

    pub fn from_repositories(
        config: Config,
        users: Arc<dyn UserRepository>,
        questions: Arc<dyn QuestionRepository>,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));

        let reconciliation_service = Arc::new(ReconciliationService::new(
            attempts.clone(),
            users.clone(),
            config.reconcile_batch_size,
        ));

        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt_service.clone())),
            user_service: Arc::new(UserService::new(users)),
            question_service: Arc::new(QuestionService::new(
                questions.clone(),
                quizzes.clone(),
                attempts.clone(),
            )),
            quiz_service: Arc::new(QuizService::new(
                quizzes.clone(),
                questions.clone(),
                attempts.clone(),
            )),
            attempt_service: Arc::new(QuizAttemptService::new(
                quizzes,
                questions,
                attempts,
                reconciliation_service.clone(),
            )),
            reconciliation_service,
            jwt_service,
            config: Arc::new(config),
            db: None,
        }
    }
}
