use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use authz_application::ports::TenantRepository;
use authz_core::{AppError, AppResult, TenantId};
use authz_domain::{Tenant, TenantStatus};

/// PostgreSQL-backed tenant repository.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: uuid::Uuid,
    name: String,
    slug: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn parse_status(value: &str) -> AppResult<TenantStatus> {
    match value {
        "active" => Ok(TenantStatus::Active),
        "inactive" => Ok(TenantStatus::Inactive),
        "suspended" => Ok(TenantStatus::Suspended),
        other => Err(AppError::Internal(format!("unknown tenant status '{other}' in storage"))),
    }
}

impl TryFrom<TenantRow> for Tenant {
    type Error = AppError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Tenant::new(
            TenantId::from_uuid(row.id),
            row.name,
            row.slug,
            parse_status(row.status.as_str())?,
            row.created_at,
            row.updated_at,
        )
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_by_id(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, slug, status, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load tenant: {error}")))?;

        row.map(Tenant::try_from).transpose()
    }
}
