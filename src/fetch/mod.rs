//! Fetch Module
//!
//! Boundary between the cache and the network. The cache only sees the
//! `Fetcher` trait; `HttpFetcher` is the reqwest-backed implementation.

mod http;

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::Result;

pub use http::HttpFetcher;

/// Lazy, finite, non-restartable sequence of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

// == Fetch Request ==
/// Everything needed to issue one upstream GET.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Target URL without the inbound query string
    pub url: String,
    /// Inbound query parameters, forwarded as-is
    pub query: Vec<(String, String)>,
    /// Extra request headers (currently only a synthesized Referer)
    pub headers: HashMap<String, String>,
}

// == Upstream Response ==
/// Status, headers and a not-yet-consumed body.
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// == Fetcher ==
/// Performs the network GET for a cache miss.
///
/// Implementations must be thread-safe; one fetcher is shared by every
/// request handler.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues the GET and returns once headers are available.
    ///
    /// Network or upstream failures are reported as `ProxyError::Fetch`.
    async fn fetch(&self, request: FetchRequest) -> Result<UpstreamResponse>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fetcher used by unit and property tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Barrier;

    use super::*;
    use crate::error::ProxyError;

    #[derive(Debug, Clone)]
    pub struct StubResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl StubResponse {
        pub fn sized(len: usize) -> Self {
            Self {
                status: 200,
                headers: Vec::new(),
                body: vec![b'x'; len],
            }
        }
    }

    /// Serves canned responses by URL and records every request it sees.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        responses: Mutex<HashMap<String, StubResponse>>,
        default_size: Option<usize>,
        delay: Option<Duration>,
        barrier: Option<Arc<Barrier>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answers unknown URLs with a body of `len` bytes instead of failing.
        pub fn with_default_size(mut self, len: usize) -> Self {
            self.default_size = Some(len);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Holds every fetch until `barrier` has been reached by all parties.
        pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
            self.barrier = Some(barrier);
            self
        }

        pub fn respond(&self, url: &str, response: StubResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, request: FetchRequest) -> Result<UpstreamResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }

            let canned = self.responses.lock().unwrap().get(&request.url).cloned();
            let response = match (canned, self.default_size) {
                (Some(response), _) => response,
                (None, Some(len)) => StubResponse::sized(len),
                (None, None) => {
                    return Err(ProxyError::Fetch(format!("no route to {}", request.url)))
                }
            };

            // Uneven pieces so re-chunking is exercised
            let pieces: Vec<Result<Bytes>> = response
                .body
                .chunks(700)
                .map(|piece| Ok(Bytes::copy_from_slice(piece)))
                .collect();

            Ok(UpstreamResponse {
                status: response.status,
                headers: response.headers,
                body: Box::pin(futures::stream::iter(pieces)),
            })
        }
    }
}
