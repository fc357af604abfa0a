//! Sandbox Error Types
//!
//! Maps handler failures to HTTP responses with a `{ "message": ... }` body,
//! the shape the client reads error text from.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Sandbox API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Missing, unknown or rejected credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Internal server error
    #[error("{0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, error_message = %self, "Sandbox error");
        } else {
            tracing::debug!(
                request_id = %request_id,
                status = status.as_u16(),
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            message: self.to_string(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for sandbox handlers
pub type ApiResult<T> = Result<T, ApiError>;
