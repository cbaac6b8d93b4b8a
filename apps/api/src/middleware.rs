use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use authz_core::AppError;

use crate::dto::AuthorizeRequest;
use crate::error::ApiResult;
use crate::state::AppState;

/// Checks the `Authorization: Bearer <SERVICE_TOKEN>` header on protected
/// routes. Missing or malformed headers are `401`; a present-but-wrong
/// token is `403`, per spec.md §6.
pub async fn require_service_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_owned()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("authorization scheme must be Bearer".to_owned()))?;

    if token != state.service_token {
        return Err(AppError::Forbidden("invalid service token".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Rate-limits `POST /authorize` per `(tenantId, principalId)` before the
/// request reaches the decision orchestrator, so an exhausted bucket never
/// pays the cost of role resolution, policy evaluation, or audit append.
///
/// Buffers the body to read the identifiers the token bucket keys on, then
/// replays the same bytes to the handler so `Json<AuthorizeRequest>`
/// extraction downstream is unaffected.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|error| AppError::InvalidRequest(format!("failed to read request body: {error}")))?;

    let parsed: AuthorizeRequest = serde_json::from_slice(&bytes)
        .map_err(|error| AppError::InvalidRequest(format!("malformed request body: {error}")))?;

    let allowed = state.rate_limiter.try_acquire(parsed.tenant_id, parsed.principal_id).await?;
    if !allowed {
        return Err(AppError::RateLimited("authorization request quota exceeded".to_owned()).into());
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
