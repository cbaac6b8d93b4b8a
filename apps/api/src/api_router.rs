use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let authorize_routes = Router::new()
        .route("/authorize", post(handlers::authorize::authorize_handler))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit));

    let audit_routes = Router::new().route("/audit", get(handlers::audit::audit_handler));

    let service_authenticated_routes = authorize_routes
        .merge(audit_routes)
        .route_layer(from_fn_with_state(app_state.clone(), middleware::require_service_token));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(service_authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
