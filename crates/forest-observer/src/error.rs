//! Error types for the observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forest_core::error::ProgressError;
use forest_types::RejectionReason;

/// Errors that can occur in the observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The request carried malformed input. State is unchanged.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command's precondition was not met.
    #[error("rejected: {0}")]
    Rejected(RejectionReason),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ProgressError> for ObserverError {
    fn from(error: ProgressError) -> Self {
        match error {
            ProgressError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            ProgressError::InvariantViolated(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ObserverError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Rejected(reason) => (StatusCode::CONFLICT, reason.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let mut body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let (Self::Rejected(reason), Some(fields)) = (&self, body.as_object_mut()) {
            fields.insert("reason".to_owned(), serde_json::json!(reason));
        }

        (status, axum::Json(body)).into_response()
    }
}
