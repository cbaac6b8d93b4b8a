use authz_core::{AppError, AppResult, NonEmptyString, PrincipalId, RoleId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;

/// Whether a principal represents a human user or a service account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// A human end user.
    User,
    /// A non-interactive service identity.
    ServiceAccount,
}

/// Principal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalStatus {
    /// Principal may authorize requests.
    Active,
    /// Principal is disabled and must be denied everything.
    Disabled,
}

/// A principal: a user or service account scoped to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    tenant_id: TenantId,
    email: NonEmptyString,
    display_name: NonEmptyString,
    kind: PrincipalKind,
    status: PrincipalStatus,
    attributes: AttributeMap,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Principal {
    /// Creates a validated principal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PrincipalId,
        tenant_id: TenantId,
        email: impl Into<String>,
        display_name: impl Into<String>,
        kind: PrincipalKind,
        status: PrincipalStatus,
        attributes: AttributeMap,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let email = NonEmptyString::new(email)?;
        if !email.as_str().contains('@') {
            return Err(AppError::InvalidRequest(
                "principal email must contain '@'".to_owned(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            email,
            display_name: NonEmptyString::new(display_name)?,
            kind,
            status,
            attributes,
            created_at,
            updated_at,
        })
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the principal's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the principal's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the principal kind.
    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    /// Returns the principal's lifecycle status.
    #[must_use]
    pub fn status(&self) -> PrincipalStatus {
        self.status
    }

    /// Returns the principal's attribute bag, used for ABAC evaluation.
    #[must_use]
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns whether the principal may currently be granted access.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, PrincipalStatus::Active)
    }

    /// Returns when the principal was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the principal was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// An assignment of a role to a principal, independent of the role's own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRole {
    principal_id: PrincipalId,
    role_id: RoleId,
    granted_by: PrincipalId,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl PrincipalRole {
    /// Creates a role assignment.
    pub fn new(
        principal_id: PrincipalId,
        role_id: RoleId,
        granted_by: PrincipalId,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        is_active: bool,
    ) -> Self {
        Self {
            principal_id,
            role_id,
            granted_by,
            granted_at,
            expires_at,
            is_active,
        }
    }

    /// Returns the assigned principal.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the principal that granted this assignment.
    #[must_use]
    pub fn granted_by(&self) -> PrincipalId {
        self.granted_by
    }

    /// Returns when this assignment was granted.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the assignment's expiry, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns whether the assignment row is administratively active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the assignment is active and not expired as of `now`.
    #[must_use]
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use super::{Principal, PrincipalKind, PrincipalRole, PrincipalStatus};
    use crate::attributes::AttributeMap;
    use authz_core::{PrincipalId, RoleId, TenantId};
    use chrono::{Duration, Utc};

    #[test]
    fn rejects_email_without_at_sign() {
        let result = Principal::new(
            PrincipalId::new(),
            TenantId::new(),
            "not-an-email",
            "Ada",
            PrincipalKind::User,
            PrincipalStatus::Active,
            AttributeMap::new(),
            Utc::now(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn expired_assignment_is_not_effective() {
        let assignment = PrincipalRole::new(
            PrincipalId::new(),
            RoleId::new(),
            PrincipalId::new(),
            Utc::now() - Duration::days(2),
            Some(Utc::now() - Duration::days(1)),
            true,
        );
        assert!(!assignment.is_effective(Utc::now()));
    }

    #[test]
    fn inactive_assignment_is_not_effective_even_without_expiry() {
        let assignment = PrincipalRole::new(
            PrincipalId::new(),
            RoleId::new(),
            PrincipalId::new(),
            Utc::now(),
            None,
            false,
        );
        assert!(!assignment.is_effective(Utc::now()));
    }
}
