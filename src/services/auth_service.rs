use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{password, JwtService},
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::{
            request::{LoginRequest, RegisterRequest},
            response::AuthResponse,
        },
    },
    repositories::UserRepository,
};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_lowercase();

        if self
            .users
            .find_by_username_or_email(&username, &email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A user with this username or email already exists.".to_string(),
            ));
        }

        let hash = password::hash_password(&request.password)?;
        let user = self.users.create(User::new(&username, &email, &hash)).await?;
        log::info!("Registered user {} ({})", user.username, user.id);

        self.issue(&user)
    }

    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        let user = self.users.find_by_username(&username).await?;

        let Some(user) = user else {
            log::info!("Login failed for unknown user {}", username);
            return Err(invalid_credentials());
        };

        if !password::verify_password(&request.password, &user.password_hash)? {
            log::info!("Login failed for user {}", user.id);
            return Err(invalid_credentials());
        }

        self.issue(&user)
    }

    pub fn token_lifetime_hours(&self) -> i64 {
        self.jwt.expiration_hours()
    }

    fn issue(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self.jwt.create_token(user)?;
        Ok(AuthResponse {
            token,
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}
