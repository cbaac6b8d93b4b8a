use async_trait::async_trait;
use authz_core::{AppResult, PrincipalId, TenantId};
use authz_domain::Principal;

/// Tenant-scoped persistence port for principals.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds a single principal by id, scoped to the tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>>;

    /// Lists every principal in the tenant.
    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>>;

    /// Persists a new principal.
    async fn create(&self, principal: Principal) -> AppResult<Principal>;

    /// Persists changes to an existing principal, including its attribute map.
    async fn update(&self, principal: Principal) -> AppResult<Principal>;
}
