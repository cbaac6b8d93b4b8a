use async_trait::async_trait;
use authz_core::{AppResult, TenantId};
use authz_domain::{ConstraintKind, RoleConstraint};

/// Tenant-scoped persistence port for separation-of-duties constraints.
#[async_trait]
pub trait ConstraintRepository: Send + Sync {
    /// Lists every constraint of `kind` defined for the tenant.
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        kind: ConstraintKind,
    ) -> AppResult<Vec<RoleConstraint>>;

    /// Persists a new constraint.
    async fn create(&self, constraint: RoleConstraint) -> AppResult<RoleConstraint>;
}
