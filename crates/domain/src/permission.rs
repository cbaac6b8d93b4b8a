use authz_core::{AppError, AppResult, NonEmptyString, PermissionId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant-defined permission, conventionally named `<resource_type>.<action>`.
///
/// Unlike a fixed system enum, permissions here are rows a tenant
/// administrator creates; `resource_type` and `action` are split out from
/// `name` so the RBAC evaluator can match on them without reparsing the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    tenant_id: TenantId,
    name: NonEmptyString,
    resource_type: NonEmptyString,
    action: NonEmptyString,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a validated permission.
    pub fn new(
        id: PermissionId,
        tenant_id: TenantId,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        action: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let resource_type = NonEmptyString::new(resource_type)?;
        let action = NonEmptyString::new(action)?;
        let name = NonEmptyString::new(name)?;
        if name.as_str() != format!("{}.{}", resource_type.as_str(), action.as_str()) {
            return Err(AppError::InvalidRequest(
                "permission name must equal '<resource_type>.<action>'".to_owned(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            name,
            resource_type,
            action,
            description,
            created_at,
            updated_at,
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the canonical `<resource_type>.<action>` name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the resource type this permission governs.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the action this permission governs.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the permission description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns when the permission was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the permission was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::Permission;
    use authz_core::{PermissionId, TenantId};
    use chrono::Utc;

    #[test]
    fn rejects_mismatched_name() {
        let result = Permission::new(
            PermissionId::new(),
            TenantId::new(),
            "invoice.write",
            "invoice",
            "delete",
            None,
            Utc::now(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn accepts_matching_name() {
        let permission = Permission::new(
            PermissionId::new(),
            TenantId::new(),
            "invoice.delete",
            "invoice",
            "delete",
            None,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid permission");
        assert_eq!(permission.name(), "invoice.delete");
    }
}
