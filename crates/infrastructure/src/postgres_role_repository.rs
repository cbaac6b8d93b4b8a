use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use authz_application::ports::RoleRepository;
use authz_core::{AppError, AppResult, RoleId, TenantId};
use authz_domain::{Role, RoleStatus};

/// PostgreSQL-backed role repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    description: Option<String>,
    parent_role_id: Option<uuid::Uuid>,
    level: i32,
    is_system: bool,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn parse_status(value: &str) -> AppResult<RoleStatus> {
    match value {
        "active" => Ok(RoleStatus::Active),
        "inactive" => Ok(RoleStatus::Inactive),
        other => Err(AppError::Internal(format!("unknown role status '{other}' in storage"))),
    }
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let level = u32::try_from(row.level)
            .map_err(|error| AppError::Internal(format!("invalid role level in storage: {error}")))?;

        Role::new(
            RoleId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.name,
            row.description,
            row.parent_role_id.map(RoleId::from_uuid),
            level,
            row.is_system,
            parse_status(row.status.as_str())?,
            row.created_at,
            row.updated_at,
        )
    }
}

fn status_str(status: RoleStatus) -> &'static str {
    match status {
        RoleStatus::Active => "active",
        RoleStatus::Inactive => "inactive",
    }
}

fn unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_by_id(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, parent_role_id, level, is_system, status, created_at, updated_at
            FROM roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    async fn list_by_ids(&self, tenant_id: TenantId, role_ids: &[RoleId]) -> AppResult<Vec<Role>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<uuid::Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, parent_role_id, level, is_system, status, created_at, updated_at
            FROM roles
            WHERE tenant_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bulk-load roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn find_children(&self, tenant_id: TenantId, parent_id: RoleId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, parent_role_id, level, is_system, status, created_at, updated_at
            FROM roles
            WHERE tenant_id = $1 AND parent_role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load child roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, description, parent_role_id, level, is_system, status, created_at, updated_at
            FROM roles
            WHERE tenant_id = $1
            ORDER BY level, name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    async fn create(&self, role: Role) -> AppResult<Role> {
        let level = i32::try_from(role.level())
            .map_err(|error| AppError::Internal(format!("invalid role level: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, tenant_id, name, description, parent_role_id, level, is_system, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(role.parent_role_id().map(|id| id.as_uuid()))
        .bind(level)
        .bind(role.is_system())
        .bind(status_str(role.status()))
        .bind(role.created_at())
        .bind(role.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if unique_violation(&error) {
                return AppError::UniqueViolation(format!(
                    "role named '{}' already exists for tenant '{}'",
                    role.name(),
                    role.tenant_id()
                ));
            }
            AppError::Internal(format!("failed to create role: {error}"))
        })?;

        Ok(role)
    }

    async fn update(&self, role: Role) -> AppResult<Role> {
        let level = i32::try_from(role.level())
            .map_err(|error| AppError::Internal(format!("invalid role level: {error}")))?;

        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $3, description = $4, parent_role_id = $5, level = $6, status = $7, updated_at = $8
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(role.tenant_id().as_uuid())
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(role.parent_role_id().map(|id| id.as_uuid()))
        .bind(level)
        .bind(status_str(role.status()))
        .bind(role.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' not found for tenant '{}'",
                role.id(),
                role.tenant_id()
            )));
        }

        Ok(role)
    }
}
