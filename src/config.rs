use secrecy::SecretString;
use std::env;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo_max_pool_size: u32,
    pub mongo_min_pool_size: u32,
    pub mongo_timeout_secs: u64,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub reconcile_interval_secs: u64,
    pub reconcile_batch_size: i64,
    pub cors_allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "quiz-local".to_string()),
            mongo_max_pool_size: env::var("MONGO_MAX_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            mongo_min_pool_size: env::var("MONGO_MIN_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            mongo_timeout_secs: env::var("MONGO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            reconcile_batch_size: env::var("RECONCILE_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Validate that production-critical configuration is set.
    /// Panics if the JWT secret is the development default or too short.
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quiz-test".to_string(),
            mongo_max_pool_size: 10,
            mongo_min_pool_size: 2,
            mongo_timeout_secs: 5,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 5000,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            reconcile_interval_secs: 60,
            reconcile_batch_size: 100,
            cors_allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}
