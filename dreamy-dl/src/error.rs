//! API error handling.
//!
//! Maps engine errors onto consistent JSON error responses. Setup failures
//! surface before any body bytes are sent; internal details are logged and
//! replaced with generic text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use relay::RelayError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::UnsupportedScheme(_) => {
                ApiError::bad_request("Unsupported media URL scheme")
            }
            RelayError::Resolution(msg) => ApiError::bad_request(msg),
            RelayError::StreamUnavailable => {
                ApiError::internal("Unable to identify a direct media stream")
            }
            RelayError::UpstreamStatus { status, reason } => ApiError::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
                reason,
            ),
            RelayError::Transport(e) => {
                tracing::error!("Upstream transport error: {}", e);
                ApiError::internal("Unable to retrieve media stream")
            }
            RelayError::ToolUnavailable { tool } => {
                ApiError::internal(format!("{tool} is not available"))
            }
            RelayError::ToolFailure { message } => ApiError::internal(message),
            RelayError::Io(e) => {
                tracing::error!("IO error: {}", e);
                ApiError::internal("An unexpected error occurred")
            }
            RelayError::Json(e) => {
                tracing::error!("Metadata parse error: {}", e);
                ApiError::internal("Failed to resolve media stream")
            }
            RelayError::Other(msg) => {
                tracing::error!("Unexpected error: {}", msg);
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
