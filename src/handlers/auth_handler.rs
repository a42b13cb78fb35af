use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    post, web, HttpResponse,
};

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, TOKEN_COOKIE},
    errors::AppError,
    models::dto::{
        request::{LoginRequest, RegisterRequest},
        response::ApiResponse,
    },
};

#[post("/register")]
async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.register(request.into_inner()).await?;
    let cookie = token_cookie(&state, &response.token);

    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(ApiResponse::success("User registered successfully", response)))
}

#[post("/login")]
async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.login(request.into_inner()).await?;
    let cookie = token_cookie(&state, &response.token);

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::success("Logged in successfully", response)))
}

pub async fn logout(auth: AuthenticatedUser) -> HttpResponse {
    log::info!("User {} logged out", auth.0.user_id());

    let mut cookie = Cookie::build(TOKEN_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::success("Logged out successfully", ()))
}

fn token_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(state.config.is_production())
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(state.auth_service.token_lifetime_hours()))
        .finish()
}
