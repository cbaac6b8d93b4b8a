use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use authz_application::ports::ConstraintRepository;
use authz_core::{AppError, AppResult, ConstraintId, RoleId, TenantId};
use authz_domain::{ConstraintKind, RoleConstraint, ViolationAction};

/// PostgreSQL-backed Separation-of-Duties constraint repository.
#[derive(Clone)]
pub struct PostgresConstraintRepository {
    pool: PgPool,
}

impl PostgresConstraintRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ConstraintRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    kind: String,
    role_set: Vec<uuid::Uuid>,
    violation_action: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn parse_kind(value: &str) -> AppResult<ConstraintKind> {
    match value {
        "static_sod" => Ok(ConstraintKind::StaticSod),
        "dynamic_sod" => Ok(ConstraintKind::DynamicSod),
        other => Err(AppError::Internal(format!("unknown constraint kind '{other}' in storage"))),
    }
}

fn kind_str(kind: ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::StaticSod => "static_sod",
        ConstraintKind::DynamicSod => "dynamic_sod",
    }
}

fn parse_violation_action(value: &str) -> AppResult<ViolationAction> {
    match value {
        "deny" => Ok(ViolationAction::Deny),
        "alert" => Ok(ViolationAction::Alert),
        other => Err(AppError::Internal(format!("unknown violation action '{other}' in storage"))),
    }
}

fn violation_action_str(action: ViolationAction) -> &'static str {
    match action {
        ViolationAction::Deny => "deny",
        ViolationAction::Alert => "alert",
    }
}

impl TryFrom<ConstraintRow> for RoleConstraint {
    type Error = AppError;

    fn try_from(row: ConstraintRow) -> Result<Self, Self::Error> {
        RoleConstraint::new(
            ConstraintId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.name,
            parse_kind(row.kind.as_str())?,
            row.role_set.into_iter().map(RoleId::from_uuid).collect(),
            parse_violation_action(row.violation_action.as_str())?,
            row.created_at,
            row.updated_at,
        )
    }
}

#[async_trait]
impl ConstraintRepository for PostgresConstraintRepository {
    async fn list_for_tenant(&self, tenant_id: TenantId, kind: ConstraintKind) -> AppResult<Vec<RoleConstraint>> {
        let rows = sqlx::query_as::<_, ConstraintRow>(
            r#"
            SELECT id, tenant_id, name, kind, role_set, violation_action, created_at, updated_at
            FROM role_constraints
            WHERE tenant_id = $1 AND kind = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(kind_str(kind))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list constraints: {error}")))?;

        rows.into_iter().map(RoleConstraint::try_from).collect()
    }

    async fn create(&self, constraint: RoleConstraint) -> AppResult<RoleConstraint> {
        let role_set: Vec<uuid::Uuid> = constraint.role_set().iter().map(RoleId::as_uuid).collect();

        sqlx::query(
            r#"
            INSERT INTO role_constraints (id, tenant_id, name, kind, role_set, violation_action, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(constraint.id().as_uuid())
        .bind(constraint.tenant_id().as_uuid())
        .bind(constraint.name())
        .bind(kind_str(constraint.kind()))
        .bind(&role_set)
        .bind(violation_action_str(constraint.violation_action()))
        .bind(constraint.created_at())
        .bind(constraint.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if matches!(&error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
            {
                return AppError::UniqueViolation(format!(
                    "constraint named '{}' already exists for tenant '{}'",
                    constraint.name(),
                    constraint.tenant_id()
                ));
            }
            AppError::Internal(format!("failed to create constraint: {error}"))
        })?;

        Ok(constraint)
    }
}
