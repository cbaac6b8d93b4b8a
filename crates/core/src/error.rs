use thiserror::Error;

/// Result type used across authz-engine crates.
pub type AppResult<T> = Result<T, AppError>;

/// Error taxonomy shared by every layer of the decision engine.
///
/// Evaluation-path errors (closure/RBAC/ABAC/policy) are converted by the
/// orchestrator into a fail-closed denial; mutation-path errors propagate
/// to callers as-is.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A query or write referenced an id belonging to a different tenant.
    #[error("tenant mismatch: {0}")]
    TenantMismatch(String),

    /// A unique constraint (name, slug, email, ...) was violated.
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Reparenting or inserting a role edge would create a cycle.
    #[error("cycle would be created: {0}")]
    CycleWouldBeCreated(String),

    /// A role assignment was rejected by a static separation-of-duties constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A policy or rule failed validation at creation time.
    #[error("policy malformed: {0}")]
    PolicyMalformed(String),

    /// Caller is not authenticated to the service surface.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but forbidden from the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Caller exceeded its request quota.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Retryable I/O failure in a storage or cache backend.
    #[error("transient backend error: {0}")]
    TransientBackend(String),

    /// Anything else; always logged and fail-closed on the evaluation path.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_includes_message() {
        let error = AppError::NotFound("role 'admin'".to_owned());
        assert_eq!(error.to_string(), "not found: role 'admin'");
    }
}
