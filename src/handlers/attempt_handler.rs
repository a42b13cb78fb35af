use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{PaginationParams, SubmitAnswersRequest},
        response::{ApiResponse, AttemptDto, Page, StartedAttemptDto},
    },
};

#[post("/start/{quiz_id}")]
async fn start_attempt(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let started = state
        .attempt_service
        .start_attempt(&quiz_id, auth.0.user_id())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Quiz attempt started",
        StartedAttemptDto {
            attempt: AttemptDto::from(started.attempt),
            quiz: started.quiz,
        },
    )))
}

#[post("/submit/{attempt_id}")]
async fn submit_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    request: web::Json<SubmitAnswersRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .submit(&attempt_id, auth.0.user_id(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Quiz submitted successfully",
        AttemptDto::from(attempt),
    )))
}

#[get("")]
async fn list_my_attempts(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let (attempts, total) = state
        .attempt_service
        .list_user_attempts(auth.0.user_id(), pagination.offset(), pagination.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Attempts retrieved",
        Page {
            items: attempts.into_iter().map(AttemptDto::from).collect(),
            total,
            offset: pagination.offset(),
            limit: pagination.limit(),
        },
    )))
}

#[get("/{attempt_id}")]
async fn get_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(&attempt_id, &auth.0).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Attempt retrieved",
        AttemptDto::from(attempt),
    )))
}
