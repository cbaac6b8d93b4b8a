use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use redis::AsyncCommands;

use crate::dto::HealthResponse;
use crate::state::AppState;

async fn postgres_is_up(state: &AppState) -> bool {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.postgres_pool)
        .await
        .is_ok()
}

async fn redis_is_up(state: &AppState) -> bool {
    let Ok(mut connection) = state.redis_client.get_multiplexed_async_connection().await else {
        return false;
    };
    matches!(connection.ping::<String>().await, Ok(value) if value.eq_ignore_ascii_case("pong"))
}

/// Handles `GET /health`. Checks both backing stores so a degraded
/// dependency is visible before it surfaces as `/authorize` failures.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = postgres_is_up(&state).await && redis_is_up(&state).await;

    let status = if healthy { "healthy" } else { "degraded" };
    let http_status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        http_status,
        Json(HealthResponse { status, service: "authz-engine", timestamp: Utc::now() }),
    )
}
