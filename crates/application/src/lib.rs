//! Application services: the authorization engine's stages (C2-C10) wired
//! over the repository ports defined in [`ports`].

#![forbid(unsafe_code)]

pub mod ports;

mod abac;
mod audit_log;
mod cache;
mod circuit_breaker;
mod constraint_checker;
mod invalidation_bus;
mod orchestrator;
mod policy_engine;
mod rate_limiter;
mod rbac;
mod role_closure;

#[cfg(test)]
pub mod test_support;

pub use abac::{AbacDecision, AbacEvaluator};
pub use audit_log::{AuditLogService, ChainVerification};
pub use cache::{decision_key, decision_prefix_for_principal, decision_prefix_for_tenant, CacheTtls, CachedDecisionStore};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use constraint_checker::{ConstraintChecker, ConstraintViolation};
pub use invalidation_bus::{entity_id_from_principal, entity_id_from_role, InvalidationBus};
pub use orchestrator::{DecisionOrchestrator, EvaluateRequest, EvaluateResponse};
pub use policy_engine::{PolicyContext, PolicyEngine, PolicyResult};
pub use rate_limiter::{RateLimiterConfig, RateLimiterService};
pub use rbac::{RbacDecision, RbacEvaluator};
pub use role_closure::{RoleClosure, RoleClosureResolver, MAX_CLOSURE_DEPTH};
