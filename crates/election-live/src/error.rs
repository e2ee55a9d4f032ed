//! Error types for the Election Live HTTP layer.
//!
//! [`LiveError`] converts into an Axum response whose body follows the
//! service's JSON error shape: `{"success": false, "message": ..., "status": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced by REST handlers.
#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    /// No route matches the request path.
    #[error("API endpoint not found: {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The service is draining and no longer accepts work.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl LiveError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for LiveError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::NotFound { path } => serde_json::json!({
                "success": false,
                "message": "API endpoint not found",
                "path": path,
                "status": status.as_u16(),
            }),
            Self::Unavailable(reason) => serde_json::json!({
                "success": false,
                "message": reason,
                "status": status.as_u16(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
