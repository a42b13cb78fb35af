use actix_web::{delete, get, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, require_owner_or_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{PaginationParams, UpdateUserRequest},
        response::{ApiResponse, Page},
    },
};

#[get("/me")]
async fn get_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.get_user(auth.0.user_id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile retrieved", user)))
}

/// Leaderboard, open to every signed-in user.
#[get("")]
async fn leaderboard(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let (items, total) = state
        .user_service
        .leaderboard(pagination.offset(), pagination.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Leaderboard retrieved",
        Page {
            items,
            total,
            offset: pagination.offset(),
            limit: pagination.limit(),
        },
    )))
}

#[get("/all")]
async fn get_all_users(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let pagination = query.into_inner();
    pagination.validate()?;

    let (items, total) = state
        .user_service
        .get_all_users_paginated(pagination.offset(), pagination.limit())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Users retrieved",
        Page {
            items,
            total,
            offset: pagination.offset(),
            limit: pagination.limit(),
        },
    )))
}

#[get("/{id}")]
async fn get_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_owner_or_admin(&auth.0, &id)?;

    let user = state.user_service.get_user(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User retrieved", user)))
}

#[put("/{id}")]
async fn update_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let user = state
        .user_service
        .update_user(&id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User updated", user)))
}

#[delete("/{id}")]
async fn delete_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    state.user_service.delete_user(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "User deleted",
        serde_json::json!({ "id": id.into_inner() }),
    )))
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/ready")]
async fn health_check_ready(state: web::Data<AppState>) -> HttpResponse {
    let db_health = match &state.db {
        Some(db) => db.health_check().await,
        None => Err(AppError::InternalError("no database configured".to_string())),
    };

    let status = if db_health.is_ok() {
        "ready"
    } else {
        "not_ready"
    };

    let response = serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if db_health.is_ok() { "ok" } else { "error" }
        }
    });

    if db_health.is_ok() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
