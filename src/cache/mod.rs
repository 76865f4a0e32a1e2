//! Cache Module
//!
//! Response caching with a fixed TTL, element and byte budgets, oldest-first
//! eviction and Referer propagation for sub-resource fetches.

mod context;
mod entry;
pub mod eviction;
pub mod freshness;
pub mod referer;
mod response_cache;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use context::RequestContext;
pub use entry::{CacheEntry, CHUNK_SIZE};
pub use eviction::EvictionPolicy;
pub use referer::ProxyReferer;
pub use response_cache::ResponseCache;
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup};
