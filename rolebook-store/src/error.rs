//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found (or soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Caller does not own the row it tried to touch.
    #[error("no permission on {entity} {id}")]
    PermissionDenied { entity: &'static str, id: i64 },

    /// Database connection error.
    #[error("database connection error: {message}")]
    Connection { message: String },

    /// Database query error.
    #[error("database query error: {message}")]
    Query { message: String },

    /// Serialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StorageError::NotFound { entity, id }
    }

    pub fn permission_denied(entity: &'static str, id: i64) -> Self {
        StorageError::PermissionDenied { entity, id }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StorageError::Connection { message: e.to_string() }
            }
            other => StorageError::Query { message: other.to_string() },
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
