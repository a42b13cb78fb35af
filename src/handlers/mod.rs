pub mod attempt_handler;
pub mod auth_handler;
pub mod question_handler;
pub mod quiz_handler;
pub mod user_handler;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::{auth::AuthMiddleware, errors::AppError};

/// Registers every route. Everything outside `/health` and the register/login
/// pair sits behind `AuthMiddleware`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(user_handler::health_check)
        .service(user_handler::health_check_ready)
        .service(
            web::scope("/auth")
                .service(auth_handler::register)
                .service(auth_handler::login)
                .service(
                    web::resource("/logout")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(auth_handler::logout)),
                ),
        )
        .service(
            web::scope("/attempts")
                .wrap(AuthMiddleware)
                .service(attempt_handler::start_attempt)
                .service(attempt_handler::submit_attempt)
                .service(attempt_handler::list_my_attempts)
                .service(attempt_handler::get_attempt),
        )
        .service(
            web::scope("/quizzes")
                .wrap(AuthMiddleware)
                .service(quiz_handler::list_quizzes)
                .service(quiz_handler::get_quiz)
                .service(quiz_handler::create_quiz)
                .service(quiz_handler::update_quiz)
                .service(quiz_handler::delete_quiz),
        )
        .service(
            web::scope("/questions")
                .wrap(AuthMiddleware)
                .service(question_handler::list_questions)
                .service(question_handler::get_question)
                .service(question_handler::create_question)
                .service(question_handler::update_question)
                .service(question_handler::delete_question),
        )
        .service(
            web::scope("/users")
                .wrap(AuthMiddleware)
                .service(user_handler::get_me)
                .service(user_handler::get_all_users)
                .service(user_handler::leaderboard)
                .service(user_handler::get_user)
                .service(user_handler::update_user)
                .service(user_handler::delete_user),
        );
}

/// Malformed JSON bodies become `ValidationError`s in the usual envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            AppError::ValidationError(format!("Invalid request body: {}", err)).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query string: {}", err)).into()
    })
}
