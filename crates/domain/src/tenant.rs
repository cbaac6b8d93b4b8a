use authz_core::{AppError, AppResult, NonEmptyString, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Tenant may authorize requests.
    Active,
    /// Tenant is provisioned but not yet usable.
    Inactive,
    /// Tenant has been suspended and must deny all requests.
    Suspended,
}

impl TenantStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

/// A tenant: the top-level isolation boundary for every persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    id: TenantId,
    name: NonEmptyString,
    slug: NonEmptyString,
    status: TenantStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates a validated tenant.
    pub fn new(
        id: TenantId,
        name: impl Into<String>,
        slug: impl Into<String>,
        status: TenantStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let slug = NonEmptyString::new(slug)?;
        if !slug
            .as_str()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AppError::InvalidRequest(
                "tenant slug must be lowercase alphanumeric with hyphens".to_owned(),
            ));
        }

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            slug,
            status,
            created_at,
            updated_at,
        })
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub fn id(&self) -> TenantId {
        self.id
    }

    /// Returns the tenant display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the unique tenant slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the tenant lifecycle status.
    #[must_use]
    pub fn status(&self) -> TenantStatus {
        self.status
    }

    /// Returns whether the tenant may currently authorize requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, TenantStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tenant, TenantStatus};
    use authz_core::TenantId;
    use chrono::Utc;

    #[test]
    fn rejects_uppercase_slug() {
        let result = Tenant::new(
            TenantId::new(),
            "Acme",
            "Acme-Corp",
            TenantStatus::Active,
            Utc::now(),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn suspended_tenant_is_not_active() {
        let tenant = Tenant::new(
            TenantId::new(),
            "Acme",
            "acme",
            TenantStatus::Suspended,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid tenant");
        assert!(!tenant.is_active());
    }
}
