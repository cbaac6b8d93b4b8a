//! authz-engine API composition root.

#![forbid(unsafe_code)]

mod api_router;
mod api_services;
mod config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use authz_core::AppError;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = config::ApiConfig::load()?;
    config::init_tracing(&config.log_level, config.log_format);

    let pool = api_services::connect_and_migrate(&config.database_url).await?;
    let app_state = api_services::build_app_state(pool, &config)?;
    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "authz-engine listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
