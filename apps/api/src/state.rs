use std::sync::Arc;

use authz_application::{AuditLogService, DecisionOrchestrator, RateLimiterService};
use redis::Client as RedisClient;
use sqlx::PgPool;

/// Shared application state, cloned into every request handler.
///
/// The invalidation bus (C8) has no caller within this surface: the
/// administrative CRUD endpoints that mutate roles/permissions/policies
/// are out of scope here (spec.md §1) and are expected to publish events
/// to it from whatever service owns that surface.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DecisionOrchestrator>,
    pub audit: Arc<AuditLogService>,
    pub rate_limiter: Arc<RateLimiterService>,
    pub postgres_pool: PgPool,
    pub redis_client: RedisClient,
    pub service_token: String,
}
