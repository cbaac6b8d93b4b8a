//! Redis-backed decision cache (C7).

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use std::time::Duration;

use authz_application::ports::DecisionCache;
use authz_core::{AppError, AppResult};

const SCAN_AND_DELETE_SCRIPT: &str = r#"
local cursor = "0"
local deleted = 0
repeat
  local result = redis.call("SCAN", cursor, "MATCH", ARGV[1], "COUNT", 1000)
  cursor = result[1]
  local keys = result[2]
  if #keys > 0 then
    deleted = deleted + redis.call("DEL", unpack(keys))
  end
until cursor == "0"
return deleted
"#;

/// Redis implementation of the decision cache port.
#[derive(Clone)]
pub struct RedisDecisionCache {
    client: redis::Client,
}

impl RedisDecisionCache {
    /// Creates a cache adapter over a configured Redis client.
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::TransientBackend(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl DecisionCache for RedisDecisionCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection
            .get(key)
            .await
            .map_err(|error| AppError::TransientBackend(format!("failed to read cache entry '{key}': {error}")))
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let ttl_seconds = ttl.as_secs().max(1);
        connection
            .set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|error| AppError::TransientBackend(format!("failed to write cache entry '{key}': {error}")))
    }

    async fn invalidate_prefix(&self, prefix: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let pattern = format!("{prefix}*");
        Script::new(SCAN_AND_DELETE_SCRIPT)
            .arg(pattern)
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| {
                AppError::TransientBackend(format!("failed to invalidate cache prefix '{prefix}': {error}"))
            })?;
        Ok(())
    }
}
