//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use services::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (bad UUID, unknown enum value, …).
    BadRequest(String),
    /// Missing or malformed identity headers.
    Unauthorized(String),
    /// Error surfaced by the application services.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::Validation(_)
        | ServiceError::InvalidVerificationCode
        | ServiceError::LimitExceeded { .. }
        | ServiceError::EmptyCart => StatusCode::BAD_REQUEST,
        ServiceError::InsufficientStock { .. }
        | ServiceError::StockUnavailable { .. }
        | ServiceError::InvalidTransition { .. }
        | ServiceError::DuplicateReview => StatusCode::CONFLICT,
        ServiceError::NotPurchased | ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::Store(inner) => {
            tracing::error!(error = %inner, "store error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
