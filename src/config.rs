//! Configuration Module
//!
//! Handles loading, validating and managing proxy configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ProxyError, Result};

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Maximum age of a cached response in milliseconds
    pub cache_duration_ms: u64,
    /// Byte budget shared by all cached responses
    pub cache_size_bytes: usize,
    /// Maximum number of cached responses
    pub cache_size_elements: usize,
    /// Number of diagnostics messages kept for /proxyinfo
    pub log_table_max_size: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Upstream request timeout in milliseconds
    pub fetch_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DURATION_MS` - Cache entry TTL in milliseconds (default: 30000)
    /// - `CACHE_SIZE_BYTES` - Total byte budget (default: 1048576)
    /// - `CACHE_SIZE_ELEMENTS` - Maximum cached responses (default: 100)
    /// - `LOG_TABLE_MAX_SIZE` - Diagnostics log capacity (default: 50)
    /// - `SERVER_PORT` - HTTP server port (default: 5000)
    /// - `FETCH_TIMEOUT_MS` - Upstream timeout in milliseconds (default: 30000)
    ///
    /// A variable that is set but does not parse is a configuration error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            cache_duration_ms: env_or("CACHE_DURATION_MS", defaults.cache_duration_ms)?,
            cache_size_bytes: env_or("CACHE_SIZE_BYTES", defaults.cache_size_bytes)?,
            cache_size_elements: env_or("CACHE_SIZE_ELEMENTS", defaults.cache_size_elements)?,
            log_table_max_size: env_or("LOG_TABLE_MAX_SIZE", defaults.log_table_max_size)?,
            server_port: env_or("SERVER_PORT", defaults.server_port)?,
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms)?,
        })
    }

    // == Validate ==
    /// Checks the cache parameters once at startup.
    ///
    /// Returns advisory warnings for legal but unusually small values, or a
    /// `Configuration` error when a required value is out of range.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.cache_duration_ms == 0 {
            return Err(ProxyError::Configuration(
                "CACHE_DURATION_MS must be greater than 0".to_string(),
            ));
        }
        if self.cache_duration_ms < 1000 {
            warnings.push(
                "CACHE_DURATION_MS is less than 1000ms. You might want to set a longer duration"
                    .to_string(),
            );
        }

        if self.cache_size_bytes == 0 {
            return Err(ProxyError::Configuration(
                "CACHE_SIZE_BYTES must be greater than 0".to_string(),
            ));
        }
        if self.cache_size_bytes < 2048 {
            warnings.push(
                "CACHE_SIZE_BYTES is less than 2KB. You might want to set a larger cache size"
                    .to_string(),
            );
        }

        if self.cache_size_elements == 0 {
            return Err(ProxyError::Configuration(
                "CACHE_SIZE_ELEMENTS must be greater than 0".to_string(),
            ));
        }
        if self.cache_size_elements < 8 {
            warnings.push(
                "CACHE_SIZE_ELEMENTS is less than 8. You might want to set a larger cache size"
                    .to_string(),
            );
        }

        if self.log_table_max_size < 2 {
            warnings.push(
                "LOG_TABLE_MAX_SIZE is less than 2. You won't be able to see much info"
                    .to_string(),
            );
        }

        Ok(warnings)
    }

    /// TTL as a `Duration`.
    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }

    /// Upstream timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_duration_ms: 30_000,
            cache_size_bytes: 1024 * 1024,
            cache_size_elements: 100,
            log_table_max_size: 50,
            server_port: 5000,
            fetch_timeout_ms: 30_000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            ProxyError::Configuration(format!("{} must be a non-negative integer, got {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
