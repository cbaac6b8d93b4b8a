//! Token-bucket rate limiting in front of `evaluate` (spec.md §6).
//!
//! Bucketed per principal so one noisy caller cannot starve another
//! tenant's or principal's requests. The bucket size and refill interval
//! are configured once at startup (`RATE_LIMIT_MAX_TOKENS`,
//! `RATE_LIMIT_INTERVAL_SECONDS`) and shared across every key.

use std::sync::Arc;

use authz_core::{AppResult, PrincipalId, TenantId};

use crate::ports::RateLimitRepository;

/// Tuning parameters for the rate limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Maximum tokens (requests) per interval.
    pub max_tokens: u32,
    /// Refill interval, in seconds.
    pub interval_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { max_tokens: 100, interval_seconds: 60 }
    }
}

/// Wraps a [`RateLimitRepository`] backend with the bucket key convention
/// used throughout this service: `ratelimit:<tenant_id>:<principal_id>`.
pub struct RateLimiterService {
    backend: Arc<dyn RateLimitRepository>,
    config: RateLimiterConfig,
}

impl RateLimiterService {
    /// Creates a service over `backend` with the given configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn RateLimitRepository>, config: RateLimiterConfig) -> Self {
        Self { backend, config }
    }

    /// Attempts to consume one token for `(tenant_id, principal_id)`.
    /// Returns `true` if the request may proceed.
    pub async fn try_acquire(&self, tenant_id: TenantId, principal_id: PrincipalId) -> AppResult<bool> {
        let key = format!("ratelimit:{tenant_id}:{principal_id}");
        self.backend
            .try_acquire(&key, self.config.max_tokens, self.config.interval_seconds)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{RateLimiterConfig, RateLimiterService};
    use crate::test_support::InMemoryRateLimitRepository;
    use authz_core::{PrincipalId, TenantId};
    use std::sync::Arc;

    #[tokio::test]
    async fn allows_requests_up_to_the_bucket_size() {
        let limiter = RateLimiterService::new(
            Arc::new(InMemoryRateLimitRepository::new()),
            RateLimiterConfig { max_tokens: 2, interval_seconds: 60 },
        );
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();

        assert!(limiter.try_acquire(tenant_id, principal_id).await.expect("acquire"));
        assert!(limiter.try_acquire(tenant_id, principal_id).await.expect("acquire"));
        assert!(!limiter.try_acquire(tenant_id, principal_id).await.expect("acquire"));
    }

    #[tokio::test]
    async fn buckets_are_isolated_per_principal() {
        let limiter = RateLimiterService::new(
            Arc::new(InMemoryRateLimitRepository::new()),
            RateLimiterConfig { max_tokens: 1, interval_seconds: 60 },
        );
        let tenant_id = TenantId::new();
        let principal_a = PrincipalId::new();
        let principal_b = PrincipalId::new();

        assert!(limiter.try_acquire(tenant_id, principal_a).await.expect("acquire"));
        assert!(limiter.try_acquire(tenant_id, principal_b).await.expect("acquire"));
    }
}
