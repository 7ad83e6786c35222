//! Error types for the key-value service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == KV Error Enum ==
/// Unified error type for the pool, backend, cache and HTTP layer.
#[derive(Error, Debug)]
pub enum KvError {
    /// The pool was closed before or while waiting for a connection
    #[error("Connection pool is closed")]
    PoolClosed,

    /// No connection became available within the configured acquire timeout
    #[error("Connection pool exhausted: no connection available after {0:?}")]
    PoolExhausted(std::time::Duration),

    /// Opening a backend connection failed
    #[error("Connection failure: {0}")]
    Connection(String),

    /// The backend rejected or failed a command
    #[error("Query failure: {0}")]
    Query(String),

    /// A cache or pool was configured with a zero size
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found (only produced by the HTTP layer)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KvError {
    /// True for the "pool closed or exhausted" family of acquire failures.
    pub fn is_pool_unavailable(&self) -> bool {
        matches!(self, KvError::PoolClosed | KvError::PoolExhausted(_))
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(err: rusqlite::Error) -> Self {
        KvError::Query(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvError::NotFound(_) => StatusCode::NOT_FOUND,
            KvError::PoolClosed | KvError::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            KvError::Connection(_)
            | KvError::Query(_)
            | KvError::InvalidCapacity(_)
            | KvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service.
pub type Result<T> = std::result::Result<T, KvError>;
