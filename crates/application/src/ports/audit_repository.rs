use async_trait::async_trait;
use authz_core::{AppResult, PrincipalId, TenantId};
use authz_domain::AuditEntry;
use chrono::{DateTime, Utc};

/// Filters for querying the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    /// Restrict to entries for this principal.
    pub principal_id: Option<PrincipalId>,
    /// Restrict to entries targeting this resource type.
    pub resource_type: Option<String>,
    /// Restrict to entries targeting this resource id.
    pub resource_id: Option<String>,
    /// Restrict to entries at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Restrict to entries at or before this time.
    pub to: Option<DateTime<Utc>>,
}

/// Tenant-scoped persistence port for the hash-chained audit log (C9).
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Returns the current chain head (the previous entry's derived hash,
    /// or `authz_core::hashing::GENESIS_HASH` for a fresh chain).
    /// Implementations serialize this read and the subsequent `append`
    /// under a per-tenant advisory lock so the chain stays well-defined
    /// under concurrent writers.
    async fn chain_head(&self, tenant_id: TenantId) -> AppResult<String>;

    /// Appends an entry and advances the chain head to its derived hash.
    async fn append(&self, entry: AuditEntry) -> AppResult<AuditEntry>;

    /// Queries entries for the tenant matching `query`, ordered by
    /// timestamp ascending.
    async fn query(&self, tenant_id: TenantId, query: AuditQuery) -> AppResult<Vec<AuditEntry>>;
}
