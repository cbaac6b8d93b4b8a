use async_trait::async_trait;
use authz_core::{AppResult, TenantId};
use authz_domain::{Policy, PolicyStatus};

/// Tenant-scoped persistence port for JSON policies.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Lists policies for the tenant with the given status, in no
    /// particular order; the policy engine is responsible for sorting by
    /// priority before evaluating them.
    async fn list_for_tenant(&self, tenant_id: TenantId, status: PolicyStatus) -> AppResult<Vec<Policy>>;

    /// Persists a new policy. Implementations validate `name`+`version`
    /// uniqueness within the tenant.
    async fn create(&self, policy: Policy) -> AppResult<Policy>;
}
