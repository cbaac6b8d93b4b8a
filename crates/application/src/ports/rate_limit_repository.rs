use async_trait::async_trait;
use authz_core::AppResult;

/// Backend port for the token-bucket rate limiter in front of `evaluate`.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Attempts to consume one token from the bucket identified by `key`.
    /// Returns `true` if a token was available (request proceeds), `false`
    /// if the bucket was empty (request is rejected with `RateLimited`).
    async fn try_acquire(&self, key: &str, max_tokens: u32, interval_seconds: u64) -> AppResult<bool>;
}
