//! Request DTOs for the proxy
//!
//! Defines how an inbound `/proxy/...` path maps to an upstream URL.

use crate::error::{ProxyError, Result};

/// Upstream target of a `GET /proxy/<host>/<path>` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Absolute upstream URL, always `http://`
    pub url: String,
}

impl ProxyTarget {
    /// Builds the target from the path captured after `/proxy/`.
    ///
    /// Returns `InvalidRequest` when the captured path has no host.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ProxyError::InvalidRequest(
                "Proxy target must start with a host, e.g. /proxy/example.com/".to_string(),
            ));
        }
        Ok(Self {
            url: format!("http://{}", path),
        })
    }
}
