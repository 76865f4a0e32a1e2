//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Proxy Error Enum ==
/// Unified error type for the caching proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Key not present in the cache
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single upstream response is larger than the whole byte budget
    #[error(
        "Received response of size {size}B but the maximum cache size is {max}B; \
         raise CACHE_SIZE_BYTES to cache it"
    )]
    OversizedResponse { size: usize, max: usize },

    /// Upstream fetch failed (network error, timeout, bad URL)
    #[error("Upstream fetch failed: {0}")]
    Fetch(String),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Invalid inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Fetch(format!("request timed out: {}", err))
        } else {
            ProxyError::Fetch(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::OversizedResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
