//! Error types for the cache and its HTTP front-end
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Config Error Enum ==
/// Rejected cache policy. Raised only while building a cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// None of max, max_size or ttl was supplied
    #[error("at least one of max, max_size or ttl is required")]
    NoConstraints,

    #[error("max must be a positive integer")]
    InvalidMax,

    #[error("max_size must be a positive integer")]
    InvalidMaxSize,

    #[error("ttl must be a positive duration")]
    InvalidTtl,

    #[error("max_entry_size must be a positive integer")]
    InvalidMaxEntrySize,
}

// == Api Error Enum ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache (absent or stale)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache could not be built from the server configuration
    #[error("Invalid cache configuration: {0}")]
    Config(#[from] ConfigError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
