//! Error types for bucket-kv
//!
//! Every failure a client can observe collapses into one of a few stable
//! status codes with a minimal JSON body. Backend detail is logged, never
//! returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Main error type for bucket-kv operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed request fields
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),

    /// Missing or wrong bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// No object stored under the requested key
    #[error("Object not found: {name}")]
    NotFound { name: String },

    /// Storage backend operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// Key cannot be expressed as an object name
    #[error("Invalid object name: {0}")]
    InvalidPath(#[from] object_store::path::Error),

    /// Key would be rewritten by the object store's path rules
    #[error("Key does not map to a distinct object name: {0}")]
    InvalidKey(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Status code and client-facing message for this error
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, *msg),
            GatewayError::InvalidPath(_) | GatewayError::InvalidKey(_) => {
                (StatusCode::BAD_REQUEST, "invalid key")
            }
            GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            GatewayError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Config(_)
            | GatewayError::Storage(_)
            | GatewayError::Io(_)
            | GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GatewayError::InvalidRequest("key required"), StatusCode::BAD_REQUEST),
            (GatewayError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                GatewayError::NotFound { name: "a".to_string() },
                StatusCode::NOT_FOUND,
            ),
            (
                GatewayError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let err = GatewayError::Storage(object_store::Error::Generic {
            store: "test",
            source: "permission denied for bucket".into(),
        });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "internal");
    }
}
