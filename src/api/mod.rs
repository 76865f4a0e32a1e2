//! API Module
//!
//! HTTP handlers and routing for the caching proxy.
//!
//! # Endpoints
//! - `GET /proxy/*target` - Fetch a URL through the cache
//! - `GET /proxyinfo` - Cache status page (JSON)
//! - `GET /health` - Health check endpoint
//! - fallback - Referer-based redirect for server-relative links

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
