//! Error types for the portal cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache, fetch layer and admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The fetcher failed and no cached payload was available to fall back on
    #[error("Fetch failed for '{key}': {message}")]
    FetchFailed { key: String, message: String },

    /// Payload could not be serialized for size estimation
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Builds a fetch failure from the fetcher's error, keeping the full cause chain.
    pub fn fetch_failed(key: impl Into<String>, err: &anyhow::Error) -> Self {
        CacheError::FetchFailed {
            key: key.into(),
            message: format!("{:#}", err),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the portal cache.
pub type Result<T> = std::result::Result<T, CacheError>;
