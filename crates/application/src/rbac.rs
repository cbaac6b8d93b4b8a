//! RBAC Evaluator (C3): does the principal's role closure carry a permission.

use authz_domain::Role;

use crate::role_closure::RoleClosure;

/// The outcome of an RBAC check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbacDecision {
    /// Whether any held role carries the required permission.
    pub allowed: bool,
    /// The specific role that granted access, if any.
    pub granting_role: Option<Role>,
    /// A human-readable justification; on denial lists the held roles.
    pub reason: String,
}

/// Checks a role closure against a set of permission names already known to
/// be granted by each held role (joined by the caller via
/// `RoleClosureResolver::resolve_permission_ids`, then mapped back to names).
pub struct RbacEvaluator;

impl RbacEvaluator {
    /// Evaluates whether `closure` grants `required_permission`
    /// (`<resource_type>.<action>`), given `role_permission_names` mapping
    /// each held role's id to the permission names it carries directly.
    #[must_use]
    pub fn evaluate(
        closure: &RoleClosure,
        role_permission_names: &[(Role, Vec<String>)],
        required_permission: &str,
    ) -> RbacDecision {
        for (role, names) in role_permission_names {
            if names.iter().any(|name| name == required_permission) {
                return RbacDecision {
                    allowed: true,
                    granting_role: Some(role.clone()),
                    reason: format!("Granted by role {} (Level {})", role.name(), role.level()),
                };
            }
        }

        let held_role_names: Vec<&str> = closure.roles.iter().map(Role::name).collect();
        RbacDecision {
            allowed: false,
            granting_role: None,
            reason: format!(
                "Missing required permission: {required_permission} (held roles: {})",
                held_role_names.join(", ")
            ),
        }
    }
}
