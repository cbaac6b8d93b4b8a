use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use authz_application::ports::AssignmentRepository;
use authz_core::{AppError, AppResult, PrincipalId, RoleId, TenantId};
use authz_domain::PrincipalRole;

/// PostgreSQL-backed role assignment repository.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves the tenant a role belongs to, since `PrincipalRole` itself
    /// is tenant-agnostic and `principal_roles` rows are tenant-scoped for
    /// indexing and isolation.
    async fn tenant_for(&self, role_id: RoleId) -> AppResult<TenantId> {
        sqlx::query_scalar::<_, uuid::Uuid>("SELECT tenant_id FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to resolve tenant for role: {error}")))?
            .map(TenantId::from_uuid)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' not found")))
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    principal_id: uuid::Uuid,
    role_id: uuid::Uuid,
    granted_by: uuid::Uuid,
    granted_at: chrono::DateTime<chrono::Utc>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    is_active: bool,
}

impl From<AssignmentRow> for PrincipalRole {
    fn from(row: AssignmentRow) -> Self {
        PrincipalRole::new(
            PrincipalId::from_uuid(row.principal_id),
            RoleId::from_uuid(row.role_id),
            PrincipalId::from_uuid(row.granted_by),
            row.granted_at,
            row.expires_at,
            row.is_active,
        )
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn list_for_principal(&self, tenant_id: TenantId, principal_id: PrincipalId) -> AppResult<Vec<PrincipalRole>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT principal_id, role_id, granted_by, granted_at, expires_at, is_active
            FROM principal_roles
            WHERE tenant_id = $1 AND principal_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments for principal: {error}")))?;

        Ok(rows.into_iter().map(PrincipalRole::from).collect())
    }

    async fn list_for_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Vec<PrincipalRole>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT principal_id, role_id, granted_by, granted_at, expires_at, is_active
            FROM principal_roles
            WHERE tenant_id = $1 AND role_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments for role: {error}")))?;

        Ok(rows.into_iter().map(PrincipalRole::from).collect())
    }

    /// Inserts the assignment row under a per-principal advisory lock, so
    /// two concurrent assignment attempts for the same principal always
    /// serialize: the second sees the first's row before deciding whether a
    /// Separation-of-Duties constraint now blocks it.
    async fn create(&self, assignment: PrincipalRole) -> AppResult<PrincipalRole> {
        let tenant_id = self.tenant_for(assignment.role_id()).await?;

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(assignment.principal_id().as_uuid().to_string())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to acquire advisory lock: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO principal_roles (tenant_id, principal_id, role_id, granted_by, granted_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, principal_id, role_id) DO UPDATE
            SET granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at,
                expires_at = EXCLUDED.expires_at,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(assignment.principal_id().as_uuid())
        .bind(assignment.role_id().as_uuid())
        .bind(assignment.granted_by().as_uuid())
        .bind(assignment.granted_at())
        .bind(assignment.expires_at())
        .bind(assignment.is_active())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create assignment: {error}")))?;

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

        Ok(assignment)
    }

    async fn revoke(&self, tenant_id: TenantId, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE principal_roles
            SET is_active = false
            WHERE tenant_id = $1 AND principal_id = $2 AND role_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke assignment: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "assignment of role '{role_id}' to principal '{principal_id}' not found"
            )));
        }

        Ok(())
    }
}
