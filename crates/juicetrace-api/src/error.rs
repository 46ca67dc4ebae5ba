//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use juicetrace_core::TraceError;
use serde::Serialize;
use std::error::Error as _;
use tracing::error;

/// Standard API error response body.
///
/// Rendered as `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// HTTP status code.
    pub code: u16,
    /// Caller-facing message.
    pub message: String,
}

impl ApiError {
    /// A 400 response.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: 400,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (status, body).into_response()
    }
}

impl From<TraceError> for ApiError {
    fn from(err: TraceError) -> Self {
        if let Some(source) = err.source() {
            error!(error = %source, "trace request failed");
        }
        Self {
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}
