//! Cache Statistics Module
//!
//! Tracks hits, misses, stale refreshes, evictions and rejected responses.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups for a URL not in the cache
    pub misses: u64,
    /// Lookups that found an expired entry and refetched it
    pub stale_refreshes: u64,
    /// Entries removed to satisfy the count or byte budget
    pub evictions: u64,
    /// Responses refused because they exceed the byte budget on their own
    pub oversized_rejections: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current sum of entry sizes
    pub total_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Fraction of lookups answered without an upstream fetch.
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale_refreshes;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale_refreshes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_oversized(&mut self) {
        self.oversized_rejections += 1;
    }

    // == Update Totals ==
    /// Updates the entry count and byte total.
    pub fn set_totals(&mut self, entries: usize, bytes: usize) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}
