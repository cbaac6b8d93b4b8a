use axum::extract::State;
use axum::Json;

use authz_application::EvaluateRequest;
use authz_domain::AttributeMap;

use crate::dto::{AuthorizeRequest, AuthorizeResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Handles `POST /authorize`. The rate-limit check has already run as
/// middleware by the time this handler executes.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Json(request): Json<AuthorizeRequest>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let evaluate_request = EvaluateRequest {
        tenant_id: request.tenant_id,
        principal_id: request.principal_id,
        action: request.action,
        resource_type: request.resource.resource_type,
        resource_id: request.resource.id,
        resource_attributes: request.resource.attributes.unwrap_or_else(AttributeMap::new),
        principal_attributes: request
            .principal
            .and_then(|principal| principal.attributes)
            .unwrap_or_else(AttributeMap::new),
        context: request.context.unwrap_or_else(AttributeMap::new),
    };

    let response = state.orchestrator.evaluate(evaluate_request).await;
    Ok(Json(AuthorizeResponse::from(response)))
}
