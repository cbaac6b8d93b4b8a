//! Wire types for the HTTP surface. Field names follow spec.md's wire
//! contract exactly (`camelCase` request fields, `snake_case` response
//! fields) rather than a single blanket convention.

use authz_application::EvaluateResponse;
use authz_core::{PrincipalId, TenantId};
use authz_domain::{AttributeMap, AuditEntry, Decision};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incoming `POST /authorize` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub tenant_id: TenantId,
    pub principal_id: PrincipalId,
    pub action: String,
    pub resource: ResourceDto,
    #[serde(default)]
    pub principal: Option<PrincipalDto>,
    #[serde(default)]
    pub context: Option<AttributeMap>,
}

/// The `resource` object of an authorize request.
#[derive(Debug, Deserialize)]
pub struct ResourceDto {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Option<AttributeMap>,
}

/// The `principal` object of an authorize request.
#[derive(Debug, Deserialize)]
pub struct PrincipalDto {
    #[serde(default)]
    pub attributes: Option<AttributeMap>,
}

/// `POST /authorize` response body.
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    pub reason: String,
    pub explanation: String,
    pub policy_evaluated: Option<String>,
    pub failed_conditions: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
    pub cache_hit: bool,
}

impl From<EvaluateResponse> for AuthorizeResponse {
    fn from(response: EvaluateResponse) -> Self {
        Self {
            allowed: response.allowed,
            reason: response.reason,
            explanation: response.explanation,
            policy_evaluated: response.policy_evaluated,
            failed_conditions: response.failed_conditions,
            evaluated_at: response.evaluated_at,
            cache_hit: response.cache_hit,
        }
    }
}

/// `GET /health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Query parameters accepted by `GET /audit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQueryParams {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub principal_id: Option<PrincipalId>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// API representation of a single hash-chained audit entry.
#[derive(Debug, Serialize)]
pub struct AuditEntryResponse {
    pub id: String,
    pub tenant_id: String,
    pub principal_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub decision: Decision,
    pub reason: String,
    pub policy_evaluated: Option<String>,
    pub request_hash: String,
    pub previous_hash: String,
    pub derived_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&AuditEntry> for AuditEntryResponse {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            tenant_id: entry.tenant_id().to_string(),
            principal_id: entry.principal_id().to_string(),
            action: entry.action().to_owned(),
            resource_type: entry.resource_type().to_owned(),
            resource_id: entry.resource_id().to_owned(),
            decision: entry.decision(),
            reason: entry.reason().to_owned(),
            policy_evaluated: entry.policy_evaluated().map(str::to_owned),
            request_hash: entry.request_hash().to_owned(),
            previous_hash: entry.previous_hash().to_owned(),
            derived_hash: entry.derived_hash().to_owned(),
            timestamp: entry.timestamp(),
        }
    }
}
