//! Redis-backed token-bucket rate limit repository.

use async_trait::async_trait;
use redis::Script;

use authz_application::ports::RateLimitRepository;
use authz_core::{AppError, AppResult};

/// Atomically increments a fixed-window counter and compares it against the
/// bucket's token budget, arming the key's expiry on first use so an idle
/// bucket refills for free instead of requiring an external sweep.
const TRY_ACQUIRE_SCRIPT: &str = r#"
local key = KEYS[1]
local max_tokens = tonumber(ARGV[1])
local interval_seconds = tonumber(ARGV[2])

local count = redis.call('INCR', key)
if count == 1 then
  redis.call('EXPIRE', key, interval_seconds)
end

if count > max_tokens then
  return 0
end
return 1
"#;

/// Redis implementation of the rate limit repository port.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    client: redis::Client,
}

impl RedisRateLimitRepository {
    /// Creates a repository over a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn try_acquire(&self, key: &str, max_tokens: u32, interval_seconds: u64) -> AppResult<bool> {
        if max_tokens == 0 {
            return Err(AppError::InvalidRequest("max_tokens must be greater than zero".to_owned()));
        }
        if interval_seconds == 0 {
            return Err(AppError::InvalidRequest("interval_seconds must be greater than zero".to_owned()));
        }

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::TransientBackend(format!("failed to connect to redis: {error}")))?;

        let allowed: i64 = Script::new(TRY_ACQUIRE_SCRIPT)
            .key(key)
            .arg(max_tokens)
            .arg(interval_seconds)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| AppError::TransientBackend(format!("failed to evaluate rate limit for '{key}': {error}")))?;

        Ok(allowed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::RedisRateLimitRepository;

    #[test]
    fn constructs_with_a_client() {
        let client = redis::Client::open("redis://127.0.0.1/").expect("valid redis url");
        let _repository = RedisRateLimitRepository::new(client);
    }
}
