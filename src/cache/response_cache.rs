//! Response Cache Module
//!
//! Async front of `CacheStore`: on a miss or a stale hit it fetches the URL
//! upstream and stores the result. Concurrent requests for the same URL are
//! serialized so only one of them goes to the network; requests for other
//! URLs are not blocked by that fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::entry::CHUNK_SIZE;
use crate::cache::eviction::EvictionPolicy;
use crate::cache::store::{CacheStore, Lookup};
use crate::cache::{CacheEntry, CacheStats, RequestContext};
use crate::config::Config;
use crate::diagnostics::DiagnosticsLog;
use crate::error::{ProxyError, Result};
use crate::fetch::{BodyStream, FetchRequest, Fetcher};

type KeyLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

// == Response Cache ==
/// Thread-safe caching front for upstream GETs.
pub struct ResponseCache {
    /// Entries and budgets
    store: RwLock<CacheStore>,
    /// Upstream client
    fetcher: Arc<dyn Fetcher>,
    /// One lock per URL with a fetch in progress or queued
    in_flight: KeyLocks,
    /// Operational messages for /proxyinfo
    log: Arc<DiagnosticsLog>,
    /// Byte budget, copied out of the store for lock-free reads
    max_bytes: usize,
}

impl ResponseCache {
    // == Constructor ==
    /// Validates `config` and creates an empty cache.
    ///
    /// Configuration warnings are written to the diagnostics log; an invalid
    /// value fails with `ProxyError::Configuration`.
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let log = Arc::new(DiagnosticsLog::new(config.log_table_max_size));
        log.info("Instantiated ResponseCache");

        let warnings = config.validate().inspect_err(|e| log.error(e.to_string()))?;
        for warning in warnings {
            log.warning(warning);
        }
        log.info("Validated configuration");

        let policy = EvictionPolicy::new(config.cache_size_elements, config.cache_size_bytes);
        let store = CacheStore::new(policy, config.cache_duration(), Arc::clone(&log));

        Ok(Self {
            store: RwLock::new(store),
            fetcher,
            in_flight: StdMutex::new(HashMap::new()),
            log,
            max_bytes: config.cache_size_bytes,
        })
    }

    // == Get ==
    /// Returns the cached response for `url`, fetching it on a miss or when
    /// the cached copy is older than the TTL.
    ///
    /// # Arguments
    /// * `url` - Target URL without query string
    /// * `ctx` - Inbound Referer and query parameters
    pub async fn get(&self, url: &str, ctx: &RequestContext) -> Result<Arc<CacheEntry>> {
        let key = ctx.cache_key(url);
        let lease = KeyLease::acquire(&self.in_flight, &key);
        let _guard = lease.lock.lock().await;

        // A stale entry is dropped by the lookup itself
        let lookup = self.store.write().await.lookup(&key);
        match lookup {
            Lookup::Fresh(entry) => Ok(entry),
            Lookup::Missing | Lookup::Stale => self.fetch_and_store(url, &key, ctx).await,
        }
    }

    // == Insert ==
    /// Fetches `url` and stores the response, replacing any existing entry.
    pub async fn insert(&self, url: &str, ctx: &RequestContext) -> Result<Arc<CacheEntry>> {
        let key = ctx.cache_key(url);
        let lease = KeyLease::acquire(&self.in_flight, &key);
        let _guard = lease.lock.lock().await;

        self.fetch_and_store(url, &key, ctx).await
    }

    async fn fetch_and_store(
        &self,
        url: &str,
        key: &str,
        ctx: &RequestContext,
    ) -> Result<Arc<CacheEntry>> {
        // Count bound is checked before the fetch, independent of response size
        self.store.write().await.enforce_count_bound();

        let request = FetchRequest {
            url: url.to_string(),
            query: ctx.query.clone(),
            headers: ctx.upstream_headers(),
        };
        if let Some(referer) = request.headers.get("Referer") {
            debug!("Fetching {} with Referer {}", key, referer);
        }

        let response = self
            .fetcher
            .fetch(request)
            .await
            .inspect_err(|e| self.log.error(format!("{} ({})", e, key)))?;

        let body = match collect_body(response.body, self.max_bytes).await {
            Ok(body) => body,
            Err(BodyError::Oversized(size)) => {
                return Err(self.store.write().await.reject_oversized(key, size));
            }
            Err(BodyError::Upstream(e)) => {
                self.log.error(format!("{} ({})", e, key));
                return Err(e);
            }
        };

        self.store
            .write()
            .await
            .store(key, response.status, body, response.headers)
    }

    // == Delete ==
    /// Removes the entry stored under `key`.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.delete(key)
    }

    // == Accessors ==
    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn total_size_bytes(&self) -> usize {
        self.store.read().await.total_size_bytes()
    }

    /// Insertion time of `key` formatted as `%Y-%m-%d %H:%M:%S %Z`.
    pub async fn entry_timestamp(&self, key: &str) -> Result<String> {
        self.store.read().await.entry_timestamp(key)
    }

    /// Cached entries, oldest first.
    pub async fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.store.read().await.entries()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Diagnostics log contents, newest first.
    pub fn log_messages(&self) -> Vec<String> {
        self.log.messages()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

// == Key Lease ==
/// Shared handle on one URL's lock.
///
/// Dropping the last lease for a URL removes its lock from the table.
struct KeyLease<'a> {
    table: &'a KeyLocks,
    key: String,
    lock: Arc<Mutex<()>>,
}

impl<'a> KeyLease<'a> {
    fn acquire(table: &'a KeyLocks, key: &str) -> Self {
        let mut locks = table.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        Self {
            table,
            key: key.to_string(),
            lock,
        }
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table plus ours: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

// == Body Collection ==
enum BodyError {
    Oversized(usize),
    Upstream(ProxyError),
}

/// Reads the whole body into `CHUNK_SIZE` chunks.
///
/// Stops reading as soon as more than `max_bytes` have arrived.
async fn collect_body(
    mut body: BodyStream,
    max_bytes: usize,
) -> std::result::Result<Vec<Bytes>, BodyError> {
    let mut chunks = Vec::new();
    let mut pending = BytesMut::new();
    let mut total = 0usize;

    while let Some(piece) = body.next().await {
        let piece = piece.map_err(BodyError::Upstream)?;
        total += piece.len();
        if total > max_bytes {
            return Err(BodyError::Oversized(total));
        }

        pending.extend_from_slice(&piece);
        while pending.len() >= CHUNK_SIZE {
            chunks.push(pending.split_to(CHUNK_SIZE).freeze());
        }
    }

    if !pending.is_empty() {
        chunks.push(pending.freeze());
    }
    Ok(chunks)
}
