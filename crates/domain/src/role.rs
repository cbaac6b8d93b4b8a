use authz_core::{NonEmptyString, RoleId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleStatus {
    /// Role participates in closure resolution and may be assigned.
    Active,
    /// Role is retired: existing assignments grant nothing.
    Inactive,
}

/// A role within a tenant's hierarchy.
///
/// `parent_role_id` forms the hierarchy edge consumed by the role closure
/// resolver (depth-bounded, cycle-checked there, not here); `level` is a
/// denormalized depth hint used for display and is not trusted for cycle
/// detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    tenant_id: TenantId,
    name: NonEmptyString,
    description: Option<String>,
    parent_role_id: Option<RoleId>,
    level: u32,
    is_system: bool,
    status: RoleStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a validated role.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
        description: Option<String>,
        parent_role_id: Option<RoleId>,
        level: u32,
        is_system: bool,
        status: RoleStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, authz_core::AppError> {
        if parent_role_id == Some(id) {
            return Err(authz_core::AppError::InvalidRequest(
                "a role cannot be its own parent".to_owned(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            description,
            parent_role_id,
            level,
            is_system,
            status,
            created_at,
            updated_at,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the immediate parent role, if any.
    #[must_use]
    pub fn parent_role_id(&self) -> Option<RoleId> {
        self.parent_role_id
    }

    /// Returns the denormalized hierarchy depth.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns whether this is a built-in role that cannot be deleted.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns the role's lifecycle status.
    #[must_use]
    pub fn status(&self) -> RoleStatus {
        self.status
    }

    /// Returns whether the role currently participates in resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, RoleStatus::Active)
    }

    /// Returns when the role was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the role was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
