//! Cache Store Module
//!
//! Synchronous map from URL to cached response. Enforces the count and byte
//! budgets on every store and answers freshness lookups. Fetching happens
//! outside, in `ResponseCache`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;

use crate::cache::eviction::{oldest_key, EvictionPolicy};
use crate::cache::freshness::is_expired;
use crate::cache::{CacheEntry, CacheStats};
use crate::diagnostics::DiagnosticsLog;
use crate::error::{ProxyError, Result};

// == Lookup ==
/// Outcome of looking a URL up.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Present and within its TTL
    Fresh(Arc<CacheEntry>),
    /// Present but older than the TTL
    Stale,
    /// Not present
    Missing,
}

// == Cache Store ==
/// Main cache storage with oldest-first eviction and lazy TTL checks.
#[derive(Debug)]
pub struct CacheStore {
    /// URL -> response
    entries: HashMap<String, Arc<CacheEntry>>,
    /// Running sum of entry sizes
    total_bytes: usize,
    /// Count and byte budgets
    policy: EvictionPolicy,
    /// Maximum entry age
    ttl: Duration,
    /// Performance statistics
    stats: CacheStats,
    /// Next insertion sequence number
    next_sequence: u64,
    /// Operational messages for /proxyinfo
    log: Arc<DiagnosticsLog>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `policy` - Element and byte budgets
    /// * `ttl` - Age after which an entry is refetched on its next lookup
    /// * `log` - Diagnostics log shared with the owning cache
    pub fn new(policy: EvictionPolicy, ttl: Duration, log: Arc<DiagnosticsLog>) -> Self {
        Self {
            entries: HashMap::new(),
            total_bytes: 0,
            policy,
            ttl,
            stats: CacheStats::new(),
            next_sequence: 0,
            log,
        }
    }

    // == Lookup ==
    /// Classifies `url` as fresh, stale or missing and records the outcome.
    ///
    /// A stale entry is removed here, under the same borrow as the check, so
    /// the caller only has to refetch it.
    pub fn lookup(&mut self, url: &str) -> Lookup {
        let Some(entry) = self.entries.get(url) else {
            self.stats.record_miss();
            self.log
                .info(format!("URL doesn't exist in cache, inserting: {}", url));
            return Lookup::Missing;
        };

        if is_expired(Utc::now(), entry.inserted_at, self.ttl) {
            self.stats.record_stale();
            self.log.info(format!(
                "URL exists in cache but is stale, fetching and caching: {}",
                url
            ));
            self.remove_entry(url);
            return Lookup::Stale;
        }

        let entry = Arc::clone(entry);
        self.stats.record_hit();
        self.log
            .info(format!("URL exists in cache and is fresh: {}", url));
        Lookup::Fresh(entry)
    }

    // == Store ==
    /// Stores a fetched response under `url`, evicting as needed.
    ///
    /// Fails with `OversizedResponse` and leaves the store untouched when the
    /// response alone exceeds the byte budget. An existing entry for `url` is
    /// replaced.
    pub fn store(
        &mut self,
        url: &str,
        status: u16,
        body: Vec<Bytes>,
        headers: Vec<(String, String)>,
    ) -> Result<Arc<CacheEntry>> {
        let entry = CacheEntry::new(url, status, body, headers, self.next_sequence);
        let size = entry.size();

        if self.policy.oversized(size) {
            return Err(self.reject_oversized(url, size));
        }

        if self.entries.contains_key(url) {
            self.delete(url)?;
        }

        self.enforce_count_bound();

        if self.policy.over_bytes(self.total_bytes, size) {
            self.log
                .info("Reached cache size Byte limit, deleting oldest record(s)");
            while self.policy.over_bytes(self.total_bytes, size) {
                if self.evict_oldest().is_none() {
                    break;
                }
            }
        }

        self.next_sequence += 1;
        self.total_bytes += size;
        let entry = Arc::new(entry);
        self.entries.insert(url.to_string(), Arc::clone(&entry));
        self.sync_totals();

        Ok(entry)
    }

    // == Reject Oversized ==
    /// Records a response that can never fit and returns the matching error.
    pub fn reject_oversized(&mut self, url: &str, size: usize) -> ProxyError {
        self.stats.record_oversized();
        let err = ProxyError::OversizedResponse {
            size,
            max: self.policy.max_bytes,
        };
        self.log.error(format!("{} ({})", err, url));
        err
    }

    // == Enforce Count Bound ==
    /// Evicts oldest entries until one more entry fits the count budget.
    pub fn enforce_count_bound(&mut self) {
        if !self.policy.over_count(self.entries.len()) {
            return;
        }
        self.log
            .info("Reached cache element limit, deleting oldest record");
        while self.policy.over_count(self.entries.len()) {
            if self.evict_oldest().is_none() {
                break;
            }
        }
    }

    // == Evict Oldest ==
    /// Removes the entry with the oldest insertion time, returning its URL.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let url = oldest_key(self.entries.iter().map(|(k, v)| (k, v.as_ref())))?;
        self.remove_entry(&url);
        self.stats.record_eviction();
        self.log.info(format!("Evicted oldest entry: {}", url));
        Some(url)
    }

    // == Delete ==
    /// Removes an entry by URL.
    pub fn delete(&mut self, url: &str) -> Result<()> {
        if self.remove_entry(url) {
            Ok(())
        } else {
            Err(ProxyError::NotFound(url.to_string()))
        }
    }

    fn remove_entry(&mut self, url: &str) -> bool {
        match self.entries.remove(url) {
            Some(entry) => {
                self.total_bytes -= entry.size();
                self.sync_totals();
                true
            }
            None => false,
        }
    }

    fn sync_totals(&mut self) {
        self.stats.set_totals(self.entries.len(), self.total_bytes);
    }

    // == Accessors ==
    /// Returns true if `url` has an entry, fresh or not.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Insertion time of `url` formatted for display.
    pub fn entry_timestamp(&self, url: &str) -> Result<String> {
        self.entries
            .get(url)
            .map(|entry| entry.timestamp())
            .ok_or_else(|| ProxyError::NotFound(url.to_string()))
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<Arc<CacheEntry>> {
        let mut entries: Vec<_> = self.entries.values().cloned().collect();
        entries.sort_by_key(|entry| (entry.inserted_at, entry.sequence));
        entries
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Sum of entry sizes in bytes.
    pub fn total_size_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
