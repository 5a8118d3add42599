use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::engine::DispatchError;
use crate::files::ReadError;

/// Every handler failure, as a status plus a client-safe message.
///
/// Rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            // Kept at 404 for compatibility with existing clients.
            DispatchError::Upstream(_) => Self::new(
                StatusCode::NOT_FOUND,
                "Error occurred while querying the model",
            ),
            DispatchError::ArgumentDecode { function, .. } => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Model returned malformed arguments for {}", function),
            ),
            DispatchError::InvalidArguments { function, source } => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid arguments for {}: {}", function, source),
            ),
            DispatchError::UnknownFunction(name) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unknown function: {}", name),
            ),
            DispatchError::Invocation { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error occurred while running the called function",
            ),
        }
    }
}

impl From<ReadError> for ApiError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "File not found"),
            ReadError::Forbidden(_) => {
                Self::new(StatusCode::FORBIDDEN, "Path is outside the readable root")
            }
            ReadError::Io(e) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred: {}", e),
            ),
        }
    }
}
