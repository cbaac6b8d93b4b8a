use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};

use authz_application::ports::PolicyRepository;
use authz_core::{AppError, AppResult, PolicyId, TenantId};
use authz_domain::{Policy, PolicyStatus, Rule};

/// PostgreSQL-backed JSON policy repository.
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    name: String,
    version: i32,
    priority: i32,
    status: String,
    rules: JsonValue,
}

fn parse_status(value: &str) -> AppResult<PolicyStatus> {
    match value {
        "active" => Ok(PolicyStatus::Active),
        "draft" => Ok(PolicyStatus::Draft),
        "inactive" => Ok(PolicyStatus::Inactive),
        other => Err(AppError::Internal(format!("unknown policy status '{other}' in storage"))),
    }
}

fn status_str(status: PolicyStatus) -> &'static str {
    match status {
        PolicyStatus::Active => "active",
        PolicyStatus::Draft => "draft",
        PolicyStatus::Inactive => "inactive",
    }
}

impl TryFrom<PolicyRow> for Policy {
    type Error = AppError;

    fn try_from(row: PolicyRow) -> Result<Self, Self::Error> {
        let rules: Vec<Rule> = serde_json::from_value(row.rules)
            .map_err(|error| AppError::PolicyMalformed(format!("stored policy rules are malformed: {error}")))?;

        Policy::new(
            PolicyId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.name,
            row.version,
            row.priority,
            parse_status(row.status.as_str())?,
            rules,
        )
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    async fn list_for_tenant(&self, tenant_id: TenantId, status: PolicyStatus) -> AppResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, tenant_id, name, version, priority, status, rules
            FROM policies
            WHERE tenant_id = $1 AND status = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(status_str(status))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list policies: {error}")))?;

        rows.into_iter().map(Policy::try_from).collect()
    }

    async fn create(&self, policy: Policy) -> AppResult<Policy> {
        let rules = serde_json::to_value(policy.rules())
            .map_err(|error| AppError::Internal(format!("failed to encode policy rules: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO policies (id, tenant_id, name, version, priority, status, rules)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(policy.id().as_uuid())
        .bind(policy.tenant_id().as_uuid())
        .bind(policy.name())
        .bind(policy.version())
        .bind(policy.priority())
        .bind(status_str(policy.status()))
        .bind(rules)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if matches!(&error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
            {
                return AppError::UniqueViolation(format!(
                    "policy '{}' version {} already exists for tenant '{}'",
                    policy.name(),
                    policy.version(),
                    policy.tenant_id()
                ));
            }
            AppError::Internal(format!("failed to create policy: {error}"))
        })?;

        Ok(policy)
    }
}
