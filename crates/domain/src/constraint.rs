use authz_core::{AppError, AppResult, ConstraintId, NonEmptyString, RoleId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of separation-of-duties constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// No principal may ever hold more than one role in the set.
    StaticSod,
    /// No principal may have more than one role in the set active at once.
    DynamicSod,
}

/// What to do when a constraint is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationAction {
    /// Reject the assignment outright.
    Deny,
    /// Allow the assignment but record an audit alert.
    Alert,
}

/// A separation-of-duties constraint over a set of mutually exclusive roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstraint {
    id: ConstraintId,
    tenant_id: TenantId,
    name: NonEmptyString,
    kind: ConstraintKind,
    role_set: Vec<RoleId>,
    violation_action: ViolationAction,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleConstraint {
    /// Creates a validated constraint. `role_set` must name at least two
    /// distinct roles; duplicates are rejected rather than silently deduped
    /// so a malformed admin request surfaces immediately.
    pub fn new(
        id: ConstraintId,
        tenant_id: TenantId,
        name: impl Into<String>,
        kind: ConstraintKind,
        role_set: Vec<RoleId>,
        violation_action: ViolationAction,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if role_set.len() < 2 {
            return Err(AppError::InvalidRequest(
                "a role constraint must name at least two roles".to_owned(),
            ));
        }

        let mut deduped = role_set.clone();
        deduped.sort_by_key(RoleId::as_uuid);
        deduped.dedup();
        if deduped.len() != role_set.len() {
            return Err(AppError::InvalidRequest(
                "a role constraint's role set must not contain duplicates".to_owned(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            kind,
            role_set,
            violation_action,
            created_at,
            updated_at,
        })
    }

    /// Returns the constraint identifier.
    #[must_use]
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the constraint kind.
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Returns the mutually exclusive role set.
    #[must_use]
    pub fn role_set(&self) -> &[RoleId] {
        &self.role_set
    }

    /// Returns the action to take on violation.
    #[must_use]
    pub fn violation_action(&self) -> ViolationAction {
        self.violation_action
    }

    /// Returns when the constraint was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the constraint was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstraintKind, RoleConstraint, ViolationAction};
    use authz_core::{ConstraintId, RoleId, TenantId};
    use chrono::Utc;

    #[test]
    fn rejects_single_role_set() {
        let result = RoleConstraint::new(
            ConstraintId::new(),
            TenantId::new(),
            "purchasing-sod",
            ConstraintKind::StaticSod,
            vec![RoleId::new()],
            ViolationAction::Deny,
            Utc::now(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_roles_in_set() {
        let role = RoleId::new();
        let result = RoleConstraint::new(
            ConstraintId::new(),
            TenantId::new(),
            "purchasing-sod",
            ConstraintKind::StaticSod,
            vec![role, role],
            ViolationAction::Deny,
            Utc::now(),
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
