//! Role Closure Resolver (C2): the transitive set of roles held by a principal.

use std::collections::HashSet;
use std::sync::Arc;

use authz_core::{AppResult, PermissionId, PrincipalId, RoleId, TenantId};
use authz_domain::Role;
use chrono::Utc;

use crate::ports::{AssignmentRepository, PermissionRepository, RoleRepository};

/// Traversal is bounded at this many ancestor hops; hitting the bound does
/// not error, it truncates and is surfaced to the caller via `truncated`.
pub const MAX_CLOSURE_DEPTH: u32 = 10;

/// The result of resolving a principal's role closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClosure {
    /// The roles held directly or transitively, ordered by level ascending
    /// then name, with no duplicates.
    pub roles: Vec<Role>,
    /// Set when the depth bound was hit before ancestry was fully walked.
    pub depth_limit_reached: bool,
}

impl RoleClosure {
    /// Returns whether any held role carries `role_id`.
    #[must_use]
    pub fn contains(&self, role_id: RoleId) -> bool {
        self.roles.iter().any(|role| role.id() == role_id)
    }

    /// Returns the ids of every role in the closure.
    #[must_use]
    pub fn role_ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(Role::id).collect()
    }
}

/// Computes role closures and flattened permission sets for principals.
pub struct RoleClosureResolver {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl RoleClosureResolver {
    /// Creates a resolver over the given repositories.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            roles,
            assignments,
            permissions,
        }
    }

    /// Resolves the closure of roles held by `principal_id` in `tenant_id`.
    ///
    /// Filters out inactive roles and inactive/expired assignments, bounds
    /// ancestor traversal at `MAX_CLOSURE_DEPTH`, and refuses to re-enter a
    /// role id already on the current descent path so a cyclic parent graph
    /// cannot loop forever.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<RoleClosure> {
        let now = Utc::now();
        let assignments = self.assignments.list_for_principal(tenant_id, principal_id).await?;
        let direct_role_ids: Vec<RoleId> = assignments
            .iter()
            .filter(|assignment| assignment.is_effective(now))
            .map(authz_domain::PrincipalRole::role_id)
            .collect();

        let mut collected: Vec<Role> = Vec::new();
        let mut seen: HashSet<RoleId> = HashSet::new();
        let mut depth_limit_reached = false;

        for role_id in direct_role_ids {
            self.walk_ancestors(
                tenant_id,
                role_id,
                &mut Vec::new(),
                &mut seen,
                &mut collected,
                &mut depth_limit_reached,
            )
            .await?;
        }

        collected.sort_by(|a, b| a.level().cmp(&b.level()).then_with(|| a.name().cmp(b.name())));

        Ok(RoleClosure {
            roles: collected,
            depth_limit_reached,
        })
    }

    async fn walk_ancestors(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        path: &mut Vec<RoleId>,
        seen: &mut HashSet<RoleId>,
        collected: &mut Vec<Role>,
        depth_limit_reached: &mut bool,
    ) -> AppResult<()> {
        if path.contains(&role_id) {
            return Ok(());
        }
        if path.len() as u32 >= MAX_CLOSURE_DEPTH {
            *depth_limit_reached = true;
            return Ok(());
        }

        let Some(role) = self.roles.find_by_id(tenant_id, role_id).await? else {
            return Ok(());
        };
        if !role.is_active() {
            return Ok(());
        }

        path.push(role_id);
        if seen.insert(role_id) {
            let parent_role_id = role.parent_role_id();
            collected.push(role);
            if let Some(parent_id) = parent_role_id {
                Box::pin(self.walk_ancestors(tenant_id, parent_id, path, seen, collected, depth_limit_reached))
                    .await?;
            }
        }
        path.pop();

        Ok(())
    }

    /// Resolves the flattened set of permission ids reachable through a
    /// principal's role closure, joining each held role's direct grants.
    pub async fn resolve_permission_ids(
        &self,
        tenant_id: TenantId,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionId>> {
        let closure = self.resolve(tenant_id, principal_id).await?;
        let mut ids = HashSet::new();
        for role in &closure.roles {
            for permission in self.permissions.list_for_role(tenant_id, role.id()).await? {
                ids.insert(permission.id());
            }
        }
        Ok(ids.into_iter().collect())
    }
}
