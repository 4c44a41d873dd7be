//! Error types for the cache and content gateway
//!
//! `StoreError` is what a persistent key-value store reports. It never leaves
//! the cache: `TtlCache` degrades every store failure to a miss. `CacheError`
//! is the HTTP-facing error and is what the content source reports.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Failure reported by a `KvStore` implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No persistent store exists in this execution context
    #[error("persistent store unavailable")]
    Unavailable,

    /// The write would exceed the store's capacity
    #[error("store quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Underlying filesystem failure
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,
}

// == Cache Error Enum ==
/// Unified error type for the gateway API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (absent or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource name is not part of the site catalogue
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The upstream content service failed or returned garbage
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// No upstream content service is configured
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::UnknownResource(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        CacheError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Upstream(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, CacheError>;
