use authz_core::AppError;

/// Builds a Redis client from a connection URL, failing fast on a
/// malformed one rather than deferring the error to first use.
pub fn build_redis_client(redis_url: &str) -> Result<redis::Client, AppError> {
    redis::Client::open(redis_url).map_err(|error| AppError::Internal(format!("invalid redis URL: {error}")))
}
