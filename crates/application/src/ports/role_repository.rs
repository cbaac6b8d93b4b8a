use async_trait::async_trait;
use authz_core::{AppResult, RoleId, TenantId};
use authz_domain::Role;

/// Tenant-scoped persistence port for roles and the role hierarchy edge.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a single role by id, scoped to the tenant.
    async fn find_by_id(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Bulk-fetches roles by id, scoped to the tenant. Used by the role
    /// closure resolver to load an entire ancestor chain in one round trip.
    async fn list_by_ids(&self, tenant_id: TenantId, role_ids: &[RoleId]) -> AppResult<Vec<Role>>;

    /// Lists the immediate children of `parent_id` (roles whose
    /// `parent_role_id` equals it), used for the reverse traversal the
    /// invalidation bus performs when a role's permissions change.
    async fn find_children(&self, tenant_id: TenantId, parent_id: RoleId) -> AppResult<Vec<Role>>;

    /// Lists every role defined for the tenant.
    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Persists a new role.
    async fn create(&self, role: Role) -> AppResult<Role>;

    /// Persists changes to an existing role, including reparenting.
    async fn update(&self, role: Role) -> AppResult<Role>;
}
