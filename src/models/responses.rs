//! Response DTOs for the proxy
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};
use crate::config::Config;

/// One cached response as listed on /proxyinfo.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    /// Cache key (target URL plus query)
    pub url: String,
    /// Upstream status code
    pub status: u16,
    /// Insertion time, `%Y-%m-%d %H:%M:%S %Z`
    pub inserted_at: String,
    /// Bytes charged against the cache budget
    pub size_bytes: usize,
}

impl From<&CacheEntry> for EntrySummary {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            url: entry.url.clone(),
            status: entry.status,
            inserted_at: entry.timestamp(),
            size_bytes: entry.size(),
        }
    }
}

/// Response body for the status page (GET /proxyinfo)
#[derive(Debug, Clone, Serialize)]
pub struct ProxyInfoResponse {
    /// Active configuration
    pub config: Config,
    /// Counters and totals
    pub stats: CacheStats,
    /// Fraction of lookups served without an upstream fetch
    pub hit_rate: f64,
    /// Cached responses, oldest first
    pub entries: Vec<EntrySummary>,
    /// Diagnostics log, newest first
    pub log: Vec<String>,
}

impl ProxyInfoResponse {
    pub fn new(
        config: Config,
        stats: CacheStats,
        entries: Vec<EntrySummary>,
        log: Vec<String>,
    ) -> Self {
        Self {
            config,
            hit_rate: stats.hit_rate(),
            stats,
            entries,
            log,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
