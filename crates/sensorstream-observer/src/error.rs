//! Error types for the HTTP layer.
//!
//! [`ObserverError`] converts into a JSON error response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(path) => (StatusCode::NOT_FOUND, format!("no route for {path}")),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
