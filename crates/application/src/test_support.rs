//! In-memory fakes for the application ports, used by this crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use authz_core::{AppResult, PermissionId, PrincipalId, RoleId, TenantId};
use authz_domain::{
    AuditEntry, ConstraintKind, Permission, Policy, PolicyStatus, Principal, PrincipalRole, Role, RoleConstraint, Tenant,
};

use crate::ports::{
    AssignmentRepository, AuditQuery, AuditRepository, ConstraintRepository, DecisionCache, PermissionRepository,
    PolicyRepository, PrincipalRepository, RateLimitRepository, RoleRepository, TenantRepository,
};

/// In-memory `RoleRepository` fake.
pub struct InMemoryRoleRepository {
    roles: Mutex<Vec<Role>>,
}

impl InMemoryRoleRepository {
    /// Seeds the fake with the given roles.
    #[must_use]
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles: Mutex::new(roles) }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_id(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(roles.iter().find(|role| role.tenant_id() == tenant_id && role.id() == role_id).cloned())
    }

    async fn list_by_ids(&self, tenant_id: TenantId, role_ids: &[RoleId]) -> AppResult<Vec<Role>> {
        let roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(roles
            .iter()
            .filter(|role| role.tenant_id() == tenant_id && role_ids.contains(&role.id()))
            .cloned()
            .collect())
    }

    async fn find_children(&self, tenant_id: TenantId, parent_id: RoleId) -> AppResult<Vec<Role>> {
        let roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(roles
            .iter()
            .filter(|role| role.tenant_id() == tenant_id && role.parent_role_id() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(roles.iter().filter(|role| role.tenant_id() == tenant_id).cloned().collect())
    }

    async fn create(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        roles.push(role.clone());
        Ok(role)
    }

    async fn update(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = roles.iter_mut().find(|existing| existing.id() == role.id()) {
            *existing = role.clone();
        }
        Ok(role)
    }
}

/// In-memory `PermissionRepository` fake.
pub struct InMemoryPermissionRepository {
    permissions: Mutex<Vec<Permission>>,
    grants: Mutex<Vec<(RoleId, PermissionId)>>,
}

impl InMemoryPermissionRepository {
    /// Seeds the fake with the given permissions and no grants.
    #[must_use]
    pub fn new(permissions: Vec<Permission>) -> Self {
        Self { permissions: Mutex::new(permissions), grants: Mutex::new(Vec::new()) }
    }

    /// Seeds the fake with permissions already granted to a role.
    #[must_use]
    pub fn with_grants(permissions: Vec<Permission>, grants: Vec<(RoleId, PermissionId)>) -> Self {
        Self { permissions: Mutex::new(permissions), grants: Mutex::new(grants) }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn find_by_id(&self, tenant_id: TenantId, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let permissions = self.permissions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(permissions
            .iter()
            .find(|permission| permission.tenant_id() == tenant_id && permission.id() == permission_id)
            .cloned())
    }

    async fn list_for_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let grants = self.grants.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let granted_ids: Vec<PermissionId> =
            grants.iter().filter(|(r, _)| *r == role_id).map(|(_, p)| *p).collect();
        Ok(permissions
            .iter()
            .filter(|permission| permission.tenant_id() == tenant_id && granted_ids.contains(&permission.id()))
            .cloned()
            .collect())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(permissions.iter().filter(|permission| permission.tenant_id() == tenant_id).cloned().collect())
    }

    async fn create(&self, permission: Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        permissions.push(permission.clone());
        Ok(permission)
    }

    async fn grant_to_role(&self, _tenant_id: TenantId, role_id: RoleId, permission_id: PermissionId) -> AppResult<()> {
        let mut grants = self.grants.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !grants.contains(&(role_id, permission_id)) {
            grants.push((role_id, permission_id));
        }
        Ok(())
    }

    async fn revoke_from_role(&self, _tenant_id: TenantId, role_id: RoleId, permission_id: PermissionId) -> AppResult<()> {
        let mut grants = self.grants.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        grants.retain(|grant| *grant != (role_id, permission_id));
        Ok(())
    }
}

/// In-memory `AssignmentRepository` fake.
pub struct InMemoryAssignmentRepository {
    assignments: Mutex<Vec<PrincipalRole>>,
}

impl InMemoryAssignmentRepository {
    /// Seeds the fake with the given assignments.
    #[must_use]
    pub fn new(assignments: Vec<PrincipalRole>) -> Self {
        Self { assignments: Mutex::new(assignments) }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn list_for_principal(&self, _tenant_id: TenantId, principal_id: PrincipalId) -> AppResult<Vec<PrincipalRole>> {
        let assignments = self.assignments.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(assignments.iter().filter(|assignment| assignment.principal_id() == principal_id).cloned().collect())
    }

    async fn list_for_role(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<PrincipalRole>> {
        let assignments = self.assignments.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(assignments.iter().filter(|assignment| assignment.role_id() == role_id).cloned().collect())
    }

    async fn create(&self, assignment: PrincipalRole) -> AppResult<PrincipalRole> {
        let mut assignments = self.assignments.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn revoke(&self, _tenant_id: TenantId, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        let mut assignments = self.assignments.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for assignment in assignments.iter_mut() {
            if assignment.principal_id() == principal_id && assignment.role_id() == role_id {
                *assignment = PrincipalRole::new(
                    principal_id,
                    role_id,
                    assignment.granted_by(),
                    assignment.granted_at(),
                    assignment.expires_at(),
                    false,
                );
            }
        }
        Ok(())
    }
}

/// In-memory `PrincipalRepository` fake.
pub struct InMemoryPrincipalRepository {
    principals: Mutex<Vec<Principal>>,
}

impl InMemoryPrincipalRepository {
    /// Seeds the fake with the given principals.
    #[must_use]
    pub fn new(principals: Vec<Principal>) -> Self {
        Self { principals: Mutex::new(principals) }
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_by_id(&self, tenant_id: TenantId, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        let principals = self.principals.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(principals
            .iter()
            .find(|principal| principal.tenant_id() == tenant_id && principal.id() == principal_id)
            .cloned())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>> {
        let principals = self.principals.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(principals.iter().filter(|principal| principal.tenant_id() == tenant_id).cloned().collect())
    }

    async fn create(&self, principal: Principal) -> AppResult<Principal> {
        let mut principals = self.principals.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        principals.push(principal.clone());
        Ok(principal)
    }

    async fn update(&self, principal: Principal) -> AppResult<Principal> {
        let mut principals = self.principals.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = principals.iter_mut().find(|existing| existing.id() == principal.id()) {
            *existing = principal.clone();
        }
        Ok(principal)
    }
}

/// In-memory `ConstraintRepository` fake.
pub struct InMemoryConstraintRepository {
    constraints: Mutex<Vec<RoleConstraint>>,
}

impl InMemoryConstraintRepository {
    /// Seeds the fake with the given constraints.
    #[must_use]
    pub fn new(constraints: Vec<RoleConstraint>) -> Self {
        Self { constraints: Mutex::new(constraints) }
    }
}

#[async_trait]
impl ConstraintRepository for InMemoryConstraintRepository {
    async fn list_for_tenant(&self, tenant_id: TenantId, kind: ConstraintKind) -> AppResult<Vec<RoleConstraint>> {
        let constraints = self.constraints.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(constraints
            .iter()
            .filter(|constraint| constraint.tenant_id() == tenant_id && constraint.kind() == kind)
            .cloned()
            .collect())
    }

    async fn create(&self, constraint: RoleConstraint) -> AppResult<RoleConstraint> {
        let mut constraints = self.constraints.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        constraints.push(constraint.clone());
        Ok(constraint)
    }
}

/// In-memory `PolicyRepository` fake.
pub struct InMemoryPolicyRepository {
    policies: Mutex<Vec<Policy>>,
}

impl InMemoryPolicyRepository {
    /// Seeds the fake with the given policies.
    #[must_use]
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies: Mutex::new(policies) }
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn list_for_tenant(&self, tenant_id: TenantId, status: PolicyStatus) -> AppResult<Vec<Policy>> {
        let policies = self.policies.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(policies
            .iter()
            .filter(|policy| policy.tenant_id() == tenant_id && policy.status() == status)
            .cloned()
            .collect())
    }

    async fn create(&self, policy: Policy) -> AppResult<Policy> {
        let mut policies = self.policies.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        policies.push(policy.clone());
        Ok(policy)
    }
}

/// In-memory `AuditRepository` fake.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty fake audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every entry appended so far, in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Overwrites the entry at `index` with `entry`, simulating tampering
    /// with a previously-appended, otherwise immutable record.
    pub fn tamper(&self, index: usize, entry: AuditEntry) {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)[index] = entry;
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn chain_head(&self, tenant_id: TenantId) -> AppResult<String> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries
            .iter()
            .filter(|entry| entry.tenant_id() == tenant_id)
            .next_back()
            .map(|entry| entry.derived_hash().to_owned())
            .unwrap_or_else(|| authz_core::hashing::GENESIS_HASH.to_owned()))
    }

    async fn append(&self, entry: AuditEntry) -> AppResult<AuditEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn query(&self, tenant_id: TenantId, query: AuditQuery) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries
            .iter()
            .filter(|entry| entry.tenant_id() == tenant_id)
            .filter(|entry| query.principal_id.is_none_or(|id| id == entry.principal_id()))
            .filter(|entry| query.resource_type.as_deref().is_none_or(|rt| rt == entry.resource_type()))
            .filter(|entry| query.resource_id.as_deref().is_none_or(|rid| rid == entry.resource_id()))
            .filter(|entry| query.from.is_none_or(|from| entry.timestamp() >= from))
            .filter(|entry| query.to.is_none_or(|to| entry.timestamp() <= to))
            .cloned()
            .collect())
    }
}

/// In-memory `DecisionCache` fake with no TTL enforcement, sufficient for
/// exercising the orchestrator's cache-hit/miss branches in tests.
#[derive(Default)]
pub struct InMemoryDecisionCache {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryDecisionCache {
    /// Creates an empty fake cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DecisionCache for InMemoryDecisionCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(key).cloned())
    }

    async fn put(&self, key: &str, value: String, _ttl: Duration) -> AppResult<()> {
        self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(key.to_owned(), value);
        Ok(())
    }

    async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()> {
        self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner).retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// In-memory `TenantRepository` fake.
pub struct InMemoryTenantRepository {
    tenants: Mutex<Vec<Tenant>>,
}

impl InMemoryTenantRepository {
    /// Seeds the fake with the given tenants.
    #[must_use]
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants: Mutex::new(tenants) }
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        let tenants = self.tenants.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(tenants.iter().find(|tenant| tenant.id() == tenant_id).cloned())
    }
}

/// In-memory `RateLimitRepository` fake backed by simple per-key counters,
/// with no real-time decay; tests that need bucket refill drive it by
/// constructing a fresh fake rather than waiting on a clock.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    remaining: Mutex<HashMap<String, u32>>,
}

impl InMemoryRateLimitRepository {
    /// Creates a fake with no keys yet seen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn try_acquire(&self, key: &str, max_tokens: u32, _interval_seconds: u64) -> AppResult<bool> {
        let mut remaining = self.remaining.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let tokens = remaining.entry(key.to_owned()).or_insert(max_tokens);
        if *tokens == 0 {
            Ok(false)
        } else {
            *tokens -= 1;
            Ok(true)
        }
    }
}
