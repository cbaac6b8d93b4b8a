use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};

use authz_application::ports::{AuditQuery, AuditRepository};
use authz_core::{hashing, AppError, AppResult, AuditEntryId, PrincipalId, TenantId};
use authz_domain::{AttributeMap, AuditEntry, Decision};

/// PostgreSQL-backed, hash-chained audit log repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    principal_id: uuid::Uuid,
    action: String,
    resource_type: String,
    resource_id: String,
    decision: String,
    reason: String,
    policy_evaluated: Option<String>,
    request_hash: String,
    previous_hash: String,
    derived_hash: String,
    timestamp: DateTime<Utc>,
    metadata: JsonValue,
}

fn parse_decision(value: &str) -> AppResult<Decision> {
    match value {
        "allowed" => Ok(Decision::Allowed),
        "denied" => Ok(Decision::Denied),
        other => Err(AppError::Internal(format!("unknown audit decision '{other}' in storage"))),
    }
}

fn decision_str(decision: Decision) -> &'static str {
    match decision {
        Decision::Allowed => "allowed",
        Decision::Denied => "denied",
    }
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = AppError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let metadata: AttributeMap = serde_json::from_value(row.metadata)
            .map_err(|error| AppError::Internal(format!("failed to decode audit metadata: {error}")))?;

        let input = authz_domain::AuditEntryInput {
            tenant_id: TenantId::from_uuid(row.tenant_id),
            principal_id: PrincipalId::from_uuid(row.principal_id),
            action: row.action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            decision: parse_decision(row.decision.as_str())?,
            reason: row.reason,
            policy_evaluated: row.policy_evaluated,
            metadata,
        };

        AuditEntry::new(
            AuditEntryId::from_uuid(row.id),
            input,
            row.request_hash,
            row.previous_hash,
            row.derived_hash,
            row.timestamp,
        )
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    /// Reads the tenant's current chain head. `AuditLogService` serializes
    /// the head read and the subsequent `append` per tenant through its own
    /// in-process mutex, so this repository needs no additional locking for
    /// a single service instance.
    async fn chain_head(&self, tenant_id: TenantId) -> AppResult<String> {
        let head = sqlx::query_scalar::<_, String>(
            r#"
            SELECT derived_hash
            FROM audit_entries
            WHERE tenant_id = $1
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read audit chain head: {error}")))?;

        Ok(head.unwrap_or_else(|| hashing::GENESIS_HASH.to_owned()))
    }

    async fn append(&self, entry: AuditEntry) -> AppResult<AuditEntry> {
        let metadata = serde_json::to_value(entry.metadata())
            .map_err(|error| AppError::Internal(format!("failed to encode audit metadata: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO audit_entries (
                id, tenant_id, principal_id, action, resource_type, resource_id,
                decision, reason, policy_evaluated, request_hash, previous_hash, derived_hash,
                timestamp, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.tenant_id().as_uuid())
        .bind(entry.principal_id().as_uuid())
        .bind(entry.action())
        .bind(entry.resource_type())
        .bind(entry.resource_id())
        .bind(decision_str(entry.decision()))
        .bind(entry.reason())
        .bind(entry.policy_evaluated())
        .bind(entry.request_hash())
        .bind(entry.previous_hash())
        .bind(entry.derived_hash())
        .bind(entry.timestamp())
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(entry)
    }

    async fn query(&self, tenant_id: TenantId, query: AuditQuery) -> AppResult<Vec<AuditEntry>> {
        let principal_id = query.principal_id.map(|id| id.as_uuid());
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, tenant_id, principal_id, action, resource_type, resource_id,
                   decision, reason, policy_evaluated, request_hash, previous_hash, derived_hash,
                   timestamp, metadata
            FROM audit_entries
            WHERE tenant_id = $1
                AND ($2::uuid IS NULL OR principal_id = $2)
                AND ($3::text IS NULL OR resource_type = $3)
                AND ($4::text IS NULL OR resource_id = $4)
                AND ($5::timestamptz IS NULL OR timestamp >= $5)
                AND ($6::timestamptz IS NULL OR timestamp <= $6)
            ORDER BY timestamp ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id)
        .bind(query.resource_type)
        .bind(query.resource_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to query audit entries: {error}")))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
