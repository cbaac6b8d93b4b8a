use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use authz_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

impl ErrorResponse {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let is_rate_limited = matches!(self.0, AppError::RateLimited(_));

        let status = match self.0 {
            AppError::InvalidRequest(_) | AppError::TenantMismatch(_) | AppError::PolicyMalformed(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueViolation(_) | AppError::Conflict(_) | AppError::CycleWouldBeCreated(_) | AppError::ConstraintViolation(_) => {
                StatusCode::CONFLICT
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::TransientBackend(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorResponse::new(self.0.to_string()));

        if is_rate_limited {
            (status, [("retry-after", "60")], payload).into_response()
        } else {
            (status, payload).into_response()
        }
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
