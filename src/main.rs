use std::time::Duration;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use quiz_server::{
    app_state::AppState,
    config::Config,
    handlers::{self, json_config, query_config},
    middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.is_production() {
        config.validate_for_production();
    }

    let state = AppState::new(config.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let reconciler = state.reconciliation_service.clone();
    tokio::spawn(
        reconciler.run_periodically(Duration::from_secs(config.reconcile_interval_secs.max(1))),
    );

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let allowed_origin = config.cors_allowed_origin.clone();
    let state = web::Data::new(state);

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
