use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use authz_application::ports::PermissionRepository;
use authz_core::{AppError, AppResult, PermissionId, RoleId, TenantId};
use authz_domain::Permission;

/// PostgreSQL-backed permission repository and role-permission association.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    resource_type: String,
    action: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        Permission::new(
            PermissionId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.name,
            row.resource_type,
            row.action,
            row.description,
            row.created_at,
            row.updated_at,
        )
    }
}

fn unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_by_id(&self, tenant_id: TenantId, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, tenant_id, name, resource_type, action, description, created_at, updated_at
            FROM permissions
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(Permission::try_from).transpose()
    }

    async fn list_for_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permissions.id, permissions.tenant_id, permissions.name, permissions.resource_type,
                   permissions.action, permissions.description, permissions.created_at, permissions.updated_at
            FROM role_permissions
            INNER JOIN permissions ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.tenant_id = $1 AND role_permissions.role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions for role: {error}")))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, tenant_id, name, resource_type, action, description, created_at, updated_at
            FROM permissions
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn create(&self, permission: Permission) -> AppResult<Permission> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, tenant_id, name, resource_type, action, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(permission.tenant_id().as_uuid())
        .bind(permission.name())
        .bind(permission.resource_type())
        .bind(permission.action())
        .bind(permission.description())
        .bind(permission.created_at())
        .bind(permission.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if unique_violation(&error) {
                return AppError::UniqueViolation(format!(
                    "permission named '{}' already exists for tenant '{}'",
                    permission.name(),
                    permission.tenant_id()
                ));
            }
            AppError::Internal(format!("failed to create permission: {error}"))
        })?;

        Ok(permission)
    }

    async fn grant_to_role(&self, tenant_id: TenantId, role_id: RoleId, permission_id: PermissionId) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (tenant_id, role_id, permission_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant permission to role: {error}")))?;

        Ok(())
    }

    async fn revoke_from_role(&self, tenant_id: TenantId, role_id: RoleId, permission_id: PermissionId) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE tenant_id = $1 AND role_id = $2 AND permission_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission from role: {error}")))?;

        Ok(())
    }
}
