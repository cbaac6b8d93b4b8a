use async_trait::async_trait;
use authz_core::AppResult;
use std::time::Duration;

/// Which TTL class a cache entry belongs to; each class has its own
/// configurable default TTL (`CACHE_TTL_AUTHORIZATION`,
/// `CACHE_TTL_ROLE_HIERARCHY`, `CACHE_TTL_POLICY`, `CACHE_TTL_TENANT_CONFIG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    /// A composed authorization decision.
    Decision,
    /// A resolved role closure.
    RoleClosure,
    /// A policy evaluation result.
    Policy,
    /// Tenant-level configuration.
    TenantConfig,
}

/// Backend port for the decision cache (C7).
///
/// Implementations must be internally safe for concurrent use and must
/// treat every key as already tenant-namespaced by the caller; this port
/// never constructs or parses keys itself, so a global (non-tenant-scoped)
/// pattern can never slip in through the interface.
#[async_trait]
pub trait DecisionCache: Send + Sync {
    /// Looks up a cached value by its fully-qualified key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a value under `key` with the given time-to-live.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> AppResult<()>;

    /// Evicts every key starting with `prefix`. Callers are responsible for
    /// ensuring `prefix` is tenant-scoped (e.g. `authz:<tenant_id>:`).
    async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()>;
}
