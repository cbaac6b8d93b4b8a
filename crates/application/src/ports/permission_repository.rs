use async_trait::async_trait;
use authz_core::{AppResult, PermissionId, RoleId, TenantId};
use authz_domain::Permission;

/// Tenant-scoped persistence port for permissions and the role-permission association.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Finds a single permission by id, scoped to the tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>>;

    /// Lists every permission granted to `role_id`, scoped to the tenant.
    async fn list_for_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Lists every permission defined for the tenant.
    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>>;

    /// Persists a new permission.
    async fn create(&self, permission: Permission) -> AppResult<Permission>;

    /// Grants a permission to a role. Idempotent: granting an already-held
    /// permission is not an error, matching the unique `(role_id,
    /// permission_id)` pair in the data model.
    async fn grant_to_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()>;

    /// Revokes a permission from a role.
    async fn revoke_from_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()>;
}
