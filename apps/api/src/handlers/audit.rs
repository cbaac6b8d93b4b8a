use axum::extract::{Query, State};
use axum::Json;

use authz_application::ports::AuditQuery;

use crate::dto::{AuditEntryResponse, AuditQueryParams};
use crate::error::ApiResult;
use crate::state::AppState;

/// Handles `GET /audit`. Requires the same service token as `/authorize`
/// (enforced by middleware); tenant scoping comes from the query string,
/// never from a header, since the audit trail is read cross-principal.
pub async fn audit_handler(
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let query = AuditQuery {
        principal_id: params.principal_id,
        resource_type: params.resource_type,
        resource_id: params.resource_id,
        from: params.from,
        to: params.to,
    };

    let entries = state.audit.query(params.tenant_id, query).await?;
    let response = entries.iter().map(AuditEntryResponse::from).collect();
    Ok(Json(response))
}
