//! Caching Proxy - A forward proxy that caches upstream GET responses
//!
//! Responses are cached by URL with a fixed TTL, bounded by element-count and
//! byte-size budgets, and evicted oldest-first.

pub mod api;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod models;

pub use api::AppState;
pub use cache::ResponseCache;
pub use config::Config;
