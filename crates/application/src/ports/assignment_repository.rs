use async_trait::async_trait;
use authz_core::{AppResult, PrincipalId, RoleId, TenantId};
use authz_domain::PrincipalRole;

/// Tenant-scoped persistence port for role assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Lists the assignment rows directly held by a principal, regardless of
    /// active/expiry state; callers filter for effectiveness themselves so
    /// the role closure resolver and audit tooling can apply different
    /// notions of "current".
    async fn list_for_principal(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PrincipalRole>>;

    /// Lists every principal directly holding `role_id`, used for the
    /// reverse traversal the invalidation bus performs on permission and
    /// role-lifecycle changes.
    async fn list_for_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<PrincipalRole>>;

    /// Creates a role assignment. Implementations must run the constraint
    /// check and this write in the same transaction, under a per-principal
    /// advisory lock (or SERIALIZABLE isolation).
    async fn create(&self, assignment: PrincipalRole) -> AppResult<PrincipalRole>;

    /// Deactivates an existing assignment.
    async fn revoke(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()>;
}
