use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rolebook_store::StorageError;
use serde_json::json;
use thiserror::Error;

/// Unified handler error, rendered as `{"error": "..."}` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("no permission on this resource")]
    PermissionDenied,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StorageError::PermissionDenied { .. } => ApiError::PermissionDenied,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
