use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use vidquiz_server::{
    app_state::AppState,
    config::Config,
    handlers,
    middleware::{RateLimitMiddleware, RateLimiter, RequestIdMiddleware},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let origins = config.allowed_origins.clone();
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_seconds),
    ));
    log::info!(
        "Vector storage {}",
        if config.vector_storage_enabled() { "enabled" } else { "disabled" }
    );

    let state = AppState::new(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(RateLimitMiddleware::new(Arc::clone(&limiter)))
            .wrap(cors(&origins))
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
    }
}
