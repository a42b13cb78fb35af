use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateQuizRequest, PaginationParams, UpdateQuizRequest},
        response::{ApiResponse, Page, QuizSummaryDto},
    },
};

#[get("")]
async fn list_quizzes(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let (quizzes, total) = state
        .quiz_service
        .list_quizzes(pagination.offset(), pagination.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Quizzes retrieved",
        Page {
            items: quizzes.into_iter().map(QuizSummaryDto::from).collect(),
            total,
            offset: pagination.offset(),
            limit: pagination.limit(),
        },
    )))
}

#[get("/{id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_public_quiz(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Quiz retrieved", quiz)))
}

#[post("")]
async fn create_quiz(
    state: web::Data<AppState>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let quiz = state
        .quiz_service
        .create_quiz(request.into_inner(), auth.0.user_id())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Quiz created",
        QuizSummaryDto::from(quiz),
    )))
}

#[put("/{id}")]
async fn update_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let quiz = state.quiz_service.update_quiz(&id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Quiz updated",
        QuizSummaryDto::from(quiz),
    )))
}

#[delete("/{id}")]
async fn delete_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let quiz = state.quiz_service.delete_quiz(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Quiz deleted",
        QuizSummaryDto::from(quiz),
    )))
}
