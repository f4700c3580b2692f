//! Crate-wide error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type for warehouse operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the write pipeline.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid runtime configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The schema literal is broken (e.g. a foreign key pointing at a
    /// table that carries no surrogate key column).
    #[error("schema misuse: {0}")]
    SchemaMisuse(String),

    /// Connection acquisition, query, commit or rollback failure.
    #[error("database error: {0}")]
    Driver(#[from] sqlx::Error),

    /// A `/log` payload that does not match the Run shape.
    #[error("invalid run payload: {0}")]
    Validation(String),
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::Driver(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            other => (StatusCode::BAD_REQUEST, other.to_string()).into_response(),
        }
    }
}
