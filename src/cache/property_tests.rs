//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the budget and freshness guarantees over arbitrary
//! request sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::cache::{CacheStore, EvictionPolicy, Lookup, RequestContext, ResponseCache};
use crate::config::Config;
use crate::diagnostics::DiagnosticsLog;
use crate::error::ProxyError;
use crate::fetch::testing::{StubFetcher, StubResponse};

// == Strategies ==
/// Small URL alphabet so sequences revisit the same keys
fn url_strategy() -> impl Strategy<Value = String> {
    "[a-h]".prop_map(|s| format!("http://{}.example/", s))
}

/// Response sizes, some larger than any budget used below
fn size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![8 => 0usize..1500, 1 => 3000usize..5000]
}

fn new_store(max_elements: usize, max_bytes: usize) -> CacheStore {
    CacheStore::new(
        EvictionPolicy::new(max_elements, max_bytes),
        Duration::from_secs(60),
        Arc::new(DiagnosticsLog::new(8)),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Count bound: after every completed store the entry count stays within budget.
    #[test]
    fn prop_count_bound(
        max_elements in 1usize..10,
        ops in prop::collection::vec((url_strategy(), size_strategy()), 1..60)
    ) {
        let mut store = new_store(max_elements, 4096);

        for (url, size) in ops {
            let _ = store.store(&url, 200, vec![Bytes::from(vec![0u8; size])], Vec::new());
            prop_assert!(
                store.len() <= max_elements,
                "Cache size {} exceeds max {}",
                store.len(),
                max_elements
            );
        }
    }

    // Byte bound: total stored size never exceeds the byte budget, and the
    // running total always equals the sum of entry sizes.
    #[test]
    fn prop_byte_bound(
        max_bytes in 1usize..4096,
        ops in prop::collection::vec((url_strategy(), size_strategy()), 1..60)
    ) {
        let mut store = new_store(100, max_bytes);

        for (url, size) in ops {
            let _ = store.store(&url, 200, vec![Bytes::from(vec![0u8; size])], Vec::new());
            prop_assert!(store.total_size_bytes() <= max_bytes);

            let sum: usize = store.entries().iter().map(|e| e.size()).sum();
            prop_assert_eq!(sum, store.total_size_bytes());
            prop_assert!(store.entries().iter().all(|e| e.size() <= max_bytes));
        }
    }

    // Oversized: a response larger than the budget fails and changes nothing.
    #[test]
    fn prop_oversized_leaves_store_unchanged(
        existing in prop::collection::vec((url_strategy(), 0usize..500), 0..8),
        extra in 1usize..1000
    ) {
        let max_bytes = 2048;
        let mut store = new_store(100, max_bytes);
        for (url, size) in &existing {
            store.store(url, 200, vec![Bytes::from(vec![0u8; *size])], Vec::new()).unwrap();
        }
        let before: Vec<String> = store.entries().iter().map(|e| e.url.clone()).collect();
        let bytes_before = store.total_size_bytes();

        let result = store.store(
            "http://huge.example/",
            200,
            vec![Bytes::from(vec![0u8; max_bytes + extra])],
            Vec::new(),
        );

        let is_oversized = matches!(result, Err(ProxyError::OversizedResponse { .. }));
        prop_assert!(is_oversized);
        let after: Vec<String> = store.entries().iter().map(|e| e.url.clone()).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(bytes_before, store.total_size_bytes());
    }

    // Eviction order: with equal-sized entries filling the count budget, the
    // next insert removes the first URL stored, regardless of reads.
    #[test]
    fn prop_evicts_oldest_not_least_recent(
        capacity in 2usize..8,
        reads in prop::collection::vec(0usize..8, 0..20)
    ) {
        let mut store = new_store(capacity, 1_000_000);
        let urls: Vec<String> = (0..capacity).map(|i| format!("http://{}.example/", i)).collect();
        for url in &urls {
            store.store(url, 200, vec![Bytes::from_static(b"x")], Vec::new()).unwrap();
        }
        for i in reads {
            let hit = matches!(store.lookup(&urls[i % capacity]), Lookup::Fresh(_));
            prop_assert!(hit);
        }

        store.store("http://new.example/", 200, vec![Bytes::from_static(b"x")], Vec::new()).unwrap();

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.contains(&urls[0]));
        prop_assert!(store.contains("http://new.example/"));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    // Within the TTL, every URL is fetched at most once no matter how often
    // it is requested, and repeated gets return identical content.
    #[test]
    fn prop_at_most_one_fetch_per_url_within_ttl(
        requests in prop::collection::vec(url_strategy(), 1..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let fetcher = Arc::new(StubFetcher::new());
            let mut sizes = HashMap::new();
            for (i, url) in requests.iter().enumerate() {
                let size = 10 + i;
                sizes.entry(url.clone()).or_insert(size);
            }
            for (url, size) in &sizes {
                fetcher.respond(url, StubResponse::sized(*size));
            }

            let config = Config {
                cache_duration_ms: 60_000,
                cache_size_bytes: 1_000_000,
                cache_size_elements: 100,
                ..Config::default()
            };
            let cache = ResponseCache::new(&config, fetcher.clone()).unwrap();

            let mut seen = HashMap::new();
            for url in &requests {
                let entry = cache.get(url, &RequestContext::default()).await.unwrap();
                let first = seen.entry(url.clone()).or_insert_with(|| Arc::clone(&entry));
                prop_assert_eq!(&first.body, &entry.body);
                prop_assert_eq!(&first.headers, &entry.headers);
            }

            prop_assert_eq!(fetcher.calls(), sizes.len());
            Ok(())
        })?;
    }
}
