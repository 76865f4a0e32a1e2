//! API Handlers
//!
//! HTTP request handlers for the proxy and its status endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{
        header::{LOCATION, REFERER},
        HeaderMap, HeaderName, HeaderValue, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::{referer, CacheEntry, RequestContext, ResponseCache};
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::models::{EntrySummary, HealthResponse, ProxyInfoResponse, ProxyTarget};

/// Headers that describe one connection and are never replayed from the cache.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Dropped on replay: the cached body is re-streamed and framed by the server.
const CONTENT_LENGTH: &str = "content-length";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Response cache shared by every request
    pub cache: Arc<ResponseCache>,
    /// Configuration reported on /proxyinfo
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: ResponseCache, config: Config) -> Self {
        Self {
            cache: Arc::new(cache),
            config: Arc::new(config),
        }
    }

    /// Creates a cache backed by `fetcher` from configuration.
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let cache = ResponseCache::new(config, fetcher)?;
        Ok(Self::new(cache, config.clone()))
    }

    /// Creates the production state: an HTTP fetcher with the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }
}

/// Handler for GET /proxy/*target
///
/// Serves `http://<target>` from the cache, fetching it on a miss or when
/// the cached copy is stale.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(target): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    let target = ProxyTarget::parse(&target)?;
    let ctx = RequestContext::from_raw_query(referer_header(&headers), query.as_deref());

    let entry = state.cache.get(&target.url, &ctx).await?;

    Ok(cached_response(&entry))
}

/// Handler for GET /proxyinfo
///
/// Returns configuration, statistics, cached entries and recent log messages.
pub async fn proxyinfo_handler(State(state): State<AppState>) -> Json<ProxyInfoResponse> {
    let stats = state.cache.stats().await;
    let entries = state
        .cache
        .entries()
        .await
        .iter()
        .map(|entry| EntrySummary::from(entry.as_ref()))
        .collect();

    Json(ProxyInfoResponse::new(
        state.config.as_ref().clone(),
        stats,
        entries,
        state.cache.log_messages(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for every other GET path.
///
/// A request referred by a proxied page (typically a server-relative link
/// such as `/static/app.js`) is redirected to the same path on the proxied
/// host. Anything else gets the status page.
pub async fn fallback_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if let Some(proxied) = referer::resolve(referer_header(&headers).as_deref()) {
        let location = proxied.proxied_path(uri.path(), uri.query());
        debug!("Redirecting referred URL {} to {}", uri, location);
        if let Ok(location) = HeaderValue::from_str(&location) {
            return (StatusCode::FOUND, [(LOCATION, location)]).into_response();
        }
    }

    proxyinfo_handler(State(state)).await.into_response()
}

fn referer_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Replays a cached entry: status, end-to-end headers, body chunks.
fn cached_response(entry: &CacheEntry) -> Response {
    let chunks: Vec<std::result::Result<_, Infallible>> =
        entry.body.iter().cloned().map(Ok).collect();
    let mut response = Response::new(Body::from_stream(futures::stream::iter(chunks)));

    *response.status_mut() = StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK);

    let headers = response.headers_mut();
    for (name, value) in &entry.headers {
        if name.eq_ignore_ascii_case(CONTENT_LENGTH)
            || HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
        {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!("Skipping unrepresentable cached header {}", name),
        }
    }

    response
}
