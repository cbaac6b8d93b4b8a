use std::sync::Arc;
use std::time::Duration;

use authz_application::{
    AuditLogService, CachedDecisionStore, CircuitBreaker, DecisionOrchestrator, RateLimiterService,
    RoleClosureResolver,
};
use authz_core::AppError;
use authz_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditRepository, PostgresPermissionRepository, PostgresPolicyRepository,
    PostgresRoleRepository, RedisDecisionCache, RedisRateLimitRepository,
};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

/// The `evaluate` call's overall deadline (spec.md §5): exceeding it
/// yields a fail-closed `internal_error` denial with no cache write and
/// no audit append.
const EVALUATE_DEADLINE: Duration = Duration::from_secs(5);

/// Wires every repository adapter, service, and the orchestrator itself
/// into the shared [`AppState`] cloned into request handlers.
pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = build_redis_client(&config.redis_url())?;

    let roles = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let assignments = Arc::new(PostgresAssignmentRepository::new(pool.clone()));
    let permissions = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let policies = Arc::new(PostgresPolicyRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let rate_limit_backend = Arc::new(RedisRateLimitRepository::new(redis_client.clone()));

    let cache_backend = Arc::new(RedisDecisionCache::new(redis_client.clone()));
    let cache_breaker = CircuitBreaker::new(config.circuit_breaker);
    let cache = Arc::new(CachedDecisionStore::new(cache_backend, config.cache_ttls, cache_breaker));

    let role_closure = RoleClosureResolver::new(roles, assignments, permissions.clone());
    let audit = Arc::new(AuditLogService::new(audit_repository));
    let rate_limiter = Arc::new(RateLimiterService::new(rate_limit_backend, config.rate_limiter));

    let orchestrator = Arc::new(DecisionOrchestrator::new(
        role_closure,
        permissions,
        policies,
        cache,
        audit.clone(),
        EVALUATE_DEADLINE,
    ));

    Ok(AppState {
        orchestrator,
        audit,
        rate_limiter,
        postgres_pool: pool,
        redis_client,
        service_token: config.service_token.clone(),
    })
}
