//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_constraint_repository;
mod postgres_permission_repository;
mod postgres_policy_repository;
mod postgres_principal_repository;
mod postgres_role_repository;
mod postgres_tenant_repository;
mod redis_decision_cache;
mod redis_rate_limit_repository;

pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_constraint_repository::PostgresConstraintRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_policy_repository::PostgresPolicyRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use redis_decision_cache::RedisDecisionCache;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
