use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};

use authz_application::ports::PrincipalRepository;
use authz_core::{AppError, AppResult, PrincipalId, TenantId};
use authz_domain::{AttributeMap, Principal, PrincipalKind, PrincipalStatus};

/// PostgreSQL-backed principal repository.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    email: String,
    display_name: String,
    kind: String,
    status: String,
    attributes: JsonValue,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn parse_kind(value: &str) -> AppResult<PrincipalKind> {
    match value {
        "user" => Ok(PrincipalKind::User),
        "service_account" => Ok(PrincipalKind::ServiceAccount),
        other => Err(AppError::Internal(format!("unknown principal kind '{other}' in storage"))),
    }
}

fn parse_status(value: &str) -> AppResult<PrincipalStatus> {
    match value {
        "active" => Ok(PrincipalStatus::Active),
        "disabled" => Ok(PrincipalStatus::Disabled),
        other => Err(AppError::Internal(format!("unknown principal status '{other}' in storage"))),
    }
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = AppError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let attributes: AttributeMap = serde_json::from_value(row.attributes)
            .map_err(|error| AppError::Internal(format!("failed to decode principal attributes: {error}")))?;

        Principal::new(
            PrincipalId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.email,
            row.display_name,
            parse_kind(row.kind.as_str())?,
            parse_status(row.status.as_str())?,
            attributes,
            row.created_at,
            row.updated_at,
        )
    }
}

fn kind_str(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::User => "user",
        PrincipalKind::ServiceAccount => "service_account",
    }
}

fn status_str(status: PrincipalStatus) -> &'static str {
    match status {
        PrincipalStatus::Active => "active",
        PrincipalStatus::Disabled => "disabled",
    }
}

fn unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_by_id(&self, tenant_id: TenantId, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, tenant_id, email, display_name, kind, status, attributes, created_at, updated_at
            FROM principals
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        row.map(Principal::try_from).transpose()
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, tenant_id, email, display_name, kind, status, attributes, created_at, updated_at
            FROM principals
            WHERE tenant_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list principals: {error}")))?;

        rows.into_iter().map(Principal::try_from).collect()
    }

    async fn create(&self, principal: Principal) -> AppResult<Principal> {
        let attributes = serde_json::to_value(principal.attributes())
            .map_err(|error| AppError::Internal(format!("failed to encode principal attributes: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO principals (id, tenant_id, email, display_name, kind, status, attributes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(principal.id().as_uuid())
        .bind(principal.tenant_id().as_uuid())
        .bind(principal.email())
        .bind(principal.display_name())
        .bind(kind_str(principal.kind()))
        .bind(status_str(principal.status()))
        .bind(attributes)
        .bind(principal.created_at())
        .bind(principal.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if unique_violation(&error) {
                return AppError::UniqueViolation(format!(
                    "principal with email '{}' already exists for tenant '{}'",
                    principal.email(),
                    principal.tenant_id()
                ));
            }
            AppError::Internal(format!("failed to create principal: {error}"))
        })?;

        Ok(principal)
    }

    async fn update(&self, principal: Principal) -> AppResult<Principal> {
        let attributes = serde_json::to_value(principal.attributes())
            .map_err(|error| AppError::Internal(format!("failed to encode principal attributes: {error}")))?;

        let result = sqlx::query(
            r#"
            UPDATE principals
            SET email = $3, display_name = $4, kind = $5, status = $6, attributes = $7, updated_at = $8
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(principal.tenant_id().as_uuid())
        .bind(principal.id().as_uuid())
        .bind(principal.email())
        .bind(principal.display_name())
        .bind(kind_str(principal.kind()))
        .bind(status_str(principal.status()))
        .bind(attributes)
        .bind(principal.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update principal: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "principal '{}' not found for tenant '{}'",
                principal.id(),
                principal.tenant_id()
            )));
        }

        Ok(principal)
    }
}
