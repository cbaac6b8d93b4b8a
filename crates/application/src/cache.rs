//! Decision Cache (C7): namespaced, TTL'd, circuit-broken access to cached
//! authorization decisions and role-closure results.

use std::sync::Arc;
use std::time::Duration;

use authz_core::{AppResult, PrincipalId, TenantId};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::circuit_breaker::CircuitBreaker;
use crate::ports::{CacheClass, DecisionCache};

/// Default time-to-live per cache class, overridable via configuration
/// (`CACHE_TTL_AUTHORIZATION`, `CACHE_TTL_ROLE_HIERARCHY`,
/// `CACHE_TTL_POLICY`, `CACHE_TTL_TENANT_CONFIG`).
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// TTL for composed authorization decisions. Default 300s.
    pub decision_seconds: u64,
    /// TTL for resolved role closures. Default 3600s.
    pub role_hierarchy_seconds: u64,
    /// TTL for policy evaluation results. Default 1800s.
    pub policy_seconds: u64,
    /// TTL for tenant-level configuration. Default 7200s.
    pub tenant_config_seconds: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            decision_seconds: 300,
            role_hierarchy_seconds: 3600,
            policy_seconds: 1800,
            tenant_config_seconds: 7200,
        }
    }
}

impl CacheTtls {
    fn ttl_for(&self, class: CacheClass) -> Duration {
        let seconds = match class {
            CacheClass::Decision => self.decision_seconds,
            CacheClass::RoleClosure => self.role_hierarchy_seconds,
            CacheClass::Policy => self.policy_seconds,
            CacheClass::TenantConfig => self.tenant_config_seconds,
        };
        Duration::from_secs(seconds)
    }
}

/// Builds the fully-qualified, tenant-scoped cache key for a cached
/// authorization decision: `authz:<tenant_id>:<principal_id>:<action>:<resource_type>:<resource_id>`.
#[must_use]
pub fn decision_key(
    tenant_id: TenantId,
    principal_id: PrincipalId,
    action: &str,
    resource_type: &str,
    resource_id: &str,
) -> String {
    format!("authz:{tenant_id}:{principal_id}:{action}:{resource_type}:{resource_id}")
}

/// Builds the tenant-scoped prefix for evicting every decision cached for
/// a principal (used on role/assignment mutations).
#[must_use]
pub fn decision_prefix_for_principal(tenant_id: TenantId, principal_id: PrincipalId) -> String {
    format!("authz:{tenant_id}:{principal_id}:")
}

/// Builds the tenant-scoped prefix for evicting every decision cached for
/// a tenant (used on policy changes, which can affect any principal).
#[must_use]
pub fn decision_prefix_for_tenant(tenant_id: TenantId) -> String {
    format!("authz:{tenant_id}:")
}

/// Wraps a [`DecisionCache`] backend with per-class TTLs and a circuit
/// breaker. On backend unavailability every lookup is treated as a miss;
/// the breaker opens after repeated failures so the orchestrator stops
/// paying the backend's latency until it recovers.
pub struct CachedDecisionStore {
    backend: Arc<dyn DecisionCache>,
    ttls: CacheTtls,
    breaker: CircuitBreaker,
}

impl CachedDecisionStore {
    /// Creates a store over `backend` with the given TTL configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn DecisionCache>, ttls: CacheTtls, breaker: CircuitBreaker) -> Self {
        Self { backend, ttls, breaker }
    }

    /// Looks up and deserializes a cached value. Returns `Ok(None)` both on
    /// a genuine miss and whenever the backend is unavailable or the
    /// breaker is open — the caller cannot distinguish the two, by design:
    /// both simply mean "recompute".
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.breaker.allow_call().await {
            return None;
        }

        match self.backend.get(key).await {
            Ok(Some(raw)) => {
                self.breaker.record_success().await;
                serde_json::from_str(&raw).ok()
            }
            Ok(None) => {
                self.breaker.record_success().await;
                None
            }
            Err(error) => {
                self.breaker.record_failure().await;
                warn!(%error, "decision cache backend unavailable on read, treating as miss");
                None
            }
        }
    }

    /// Serializes and stores `value` under `key` with the default TTL for
    /// `class`. Failures are logged and swallowed: a cache write failure
    /// must never alter the decision already computed.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, class: CacheClass) {
        if !self.breaker.allow_call().await {
            return;
        }

        let Ok(raw) = serde_json::to_string(value) else {
            warn!("failed to serialize value for decision cache write, skipping");
            return;
        };

        match self.backend.put(key, raw, self.ttls.ttl_for(class)).await {
            Ok(()) => self.breaker.record_success().await,
            Err(error) => {
                self.breaker.record_failure().await;
                warn!(%error, "decision cache backend unavailable on write, decision not cached");
            }
        }
    }

    /// Evicts every key under `prefix`. Callers are responsible for
    /// tenant-scoping `prefix` (see [`decision_prefix_for_principal`] and
    /// [`decision_prefix_for_tenant`]); this store never constructs a
    /// global, non-tenant-scoped pattern.
    pub async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()> {
        self.backend.invalidate_prefix(prefix).await
    }

    /// Returns whether the backend is currently presumed healthy, for the
    /// `/health` endpoint's per-dependency status.
    pub async fn is_healthy(&self) -> bool {
        !matches!(self.breaker.state().await, crate::circuit_breaker::CircuitState::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::{decision_key, CacheTtls, CachedDecisionStore};
    use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    use crate::ports::CacheClass;
    use crate::test_support::InMemoryDecisionCache;
    use authz_core::{PrincipalId, TenantId};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Dummy {
        value: u32,
    }

    #[tokio::test]
    async fn round_trips_through_serialization() {
        let store = CachedDecisionStore::new(
            Arc::new(InMemoryDecisionCache::new()),
            CacheTtls::default(),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
        );
        let key = decision_key(TenantId::new(), PrincipalId::new(), "read", "doc", "1");
        store.put(&key, &Dummy { value: 7 }, CacheClass::Decision).await;

        let loaded: Option<Dummy> = store.get(&key).await;
        assert_eq!(loaded, Some(Dummy { value: 7 }));
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let store = CachedDecisionStore::new(
            Arc::new(InMemoryDecisionCache::new()),
            CacheTtls::default(),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
        );
        let loaded: Option<Dummy> = store.get("authz:missing").await;
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn key_includes_tenant_for_isolation() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let principal_id = PrincipalId::new();
        let key_a = decision_key(tenant_a, principal_id, "read", "doc", "1");
        let key_b = decision_key(tenant_b, principal_id, "read", "doc", "1");
        assert_ne!(key_a, key_b);
    }
}
