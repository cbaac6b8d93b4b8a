//! Constraint Checker (C6): Separation-of-Duties enforcement on role assignment.

use std::collections::HashSet;
use std::sync::Arc;

use authz_core::{AppError, AppResult, PrincipalId, RoleId, TenantId};
use authz_domain::{ConstraintKind, RoleConstraint, ViolationAction};

use crate::ports::ConstraintRepository;
use crate::role_closure::RoleClosureResolver;

/// A detected Separation-of-Duties violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// The violated constraint.
    pub constraint_name: String,
    /// The roles from the constraint's set the principal would simultaneously hold.
    pub conflicting_roles: Vec<RoleId>,
}

/// Checks static Separation-of-Duties constraints before a role assignment commits.
pub struct ConstraintChecker {
    constraints: Arc<dyn ConstraintRepository>,
}

impl ConstraintChecker {
    /// Creates a checker over the given constraint repository.
    #[must_use]
    pub fn new(constraints: Arc<dyn ConstraintRepository>) -> Self {
        Self { constraints }
    }

    /// Checks whether assigning `role_id` to `principal_id` would violate
    /// any active `static_sod` constraint, given the principal's current
    /// role closure (computed by the caller via `RoleClosureResolver` within
    /// the same transaction as the prospective write).
    ///
    /// Returns `Ok(Some(violation))` when a `deny`-action constraint is
    /// violated (the caller must reject the assignment), `Ok(None)` when no
    /// blocking violation exists (an `alert`-action violation is logged by
    /// the caller via the returned `Vec` from `detect_violations` instead of
    /// failing the write).
    pub async fn check_assignment(
        &self,
        tenant_id: TenantId,
        closure_role_ids: &[RoleId],
        candidate_role: RoleId,
    ) -> AppResult<Vec<ConstraintViolation>> {
        let mut prospective: HashSet<RoleId> = closure_role_ids.iter().copied().collect();
        prospective.insert(candidate_role);

        let constraints = self.constraints.list_for_tenant(tenant_id, ConstraintKind::StaticSod).await?;
        let mut violations = Vec::new();
        for constraint in &constraints {
            let conflicting: Vec<RoleId> =
                constraint.role_set().iter().copied().filter(|role_id| prospective.contains(role_id)).collect();
            if conflicting.len() >= 2 {
                violations.push(ConstraintViolation {
                    constraint_name: constraint.name().to_owned(),
                    conflicting_roles: conflicting,
                });
                if matches!(constraint.violation_action(), ViolationAction::Deny) {
                    return Err(AppError::ConstraintViolation(format!(
                        "assignment would violate static separation-of-duties constraint '{}'",
                        constraint.name()
                    )));
                }
            }
        }

        Ok(violations)
    }

    /// Convenience wrapper that resolves the principal's current closure via
    /// `resolver` before delegating to `check_assignment`.
    pub async fn check_assignment_for_principal(
        &self,
        resolver: &RoleClosureResolver,
        tenant_id: TenantId,
        principal_id: PrincipalId,
        candidate_role: RoleId,
    ) -> AppResult<Vec<ConstraintViolation>> {
        let closure = resolver.resolve(tenant_id, principal_id).await?;
        self.check_assignment(tenant_id, &closure.role_ids(), candidate_role).await
    }
}

#[cfg(test)]
mod tests {
    use super::ConstraintChecker;
    use crate::test_support::InMemoryConstraintRepository;
    use authz_core::{ConstraintId, RoleId, TenantId};
    use authz_domain::{ConstraintKind, RoleConstraint, ViolationAction};
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn denies_when_two_constrained_roles_would_coexist() {
        let tenant_id = TenantId::new();
        let finance = RoleId::new();
        let hr = RoleId::new();
        let constraint = RoleConstraint::new(
            ConstraintId::new(),
            tenant_id,
            "finance-hr-sod",
            ConstraintKind::StaticSod,
            vec![finance, hr],
            ViolationAction::Deny,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid constraint");

        let checker = ConstraintChecker::new(Arc::new(InMemoryConstraintRepository::new(vec![constraint])));
        let result = checker.check_assignment(tenant_id, &[finance], hr).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn alert_action_records_but_does_not_block() {
        let tenant_id = TenantId::new();
        let finance = RoleId::new();
        let hr = RoleId::new();
        let constraint = RoleConstraint::new(
            ConstraintId::new(),
            tenant_id,
            "finance-hr-sod",
            ConstraintKind::StaticSod,
            vec![finance, hr],
            ViolationAction::Alert,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid constraint");

        let checker = ConstraintChecker::new(Arc::new(InMemoryConstraintRepository::new(vec![constraint])));
        let violations = checker.check_assignment(tenant_id, &[finance], hr).await.expect("not blocked");
        assert_eq!(violations.len(), 1);
    }

    #[tokio::test]
    async fn unrelated_role_does_not_trigger_constraint() {
        let tenant_id = TenantId::new();
        let finance = RoleId::new();
        let hr = RoleId::new();
        let other = RoleId::new();
        let constraint = RoleConstraint::new(
            ConstraintId::new(),
            tenant_id,
            "finance-hr-sod",
            ConstraintKind::StaticSod,
            vec![finance, hr],
            ViolationAction::Deny,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid constraint");

        let checker = ConstraintChecker::new(Arc::new(InMemoryConstraintRepository::new(vec![constraint])));
        let violations = checker.check_assignment(tenant_id, &[finance], other).await.expect("not blocked");
        assert!(violations.is_empty());
    }
}
