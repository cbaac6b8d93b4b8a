use async_trait::async_trait;
use authz_core::{AppResult, TenantId};
use authz_domain::Tenant;

/// Persistence port for tenants, the top-level isolation boundary.
///
/// Narrow by design: the decision engine only ever needs to read a
/// tenant's lifecycle status before evaluating a request. Full tenant
/// CRUD is an administrative surface outside this specification's core
/// (see spec.md §1).
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Finds a tenant by id.
    async fn find_by_id(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>>;
}
