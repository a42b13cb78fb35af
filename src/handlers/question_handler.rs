use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateQuestionRequest, PaginationParams, UpdateQuestionRequest},
        response::{ApiResponse, Page},
    },
};

// Questions carry their correct answers, so every route here is admin-only.

#[get("")]
async fn list_questions(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let pagination = query.into_inner();
    pagination.validate()?;

    let (items, total) = state
        .question_service
        .list_questions(pagination.offset(), pagination.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Questions retrieved",
        Page {
            items,
            total,
            offset: pagination.offset(),
            limit: pagination.limit(),
        },
    )))
}

#[get("/{id}")]
async fn get_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let question = state.question_service.get_question(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Question retrieved", question)))
}

#[post("")]
async fn create_question(
    state: web::Data<AppState>,
    request: web::Json<CreateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let question = state
        .question_service
        .create_question(request.into_inner(), auth.0.user_id())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("Question created", question)))
}

#[put("/{id}")]
async fn update_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let question = state
        .question_service
        .update_question(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Question updated", question)))
}

#[delete("/{id}")]
async fn delete_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let question = state.question_service.delete_question(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Question deleted", question)))
}
