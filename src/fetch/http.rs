//! reqwest-backed upstream client.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use super::{FetchRequest, Fetcher, UpstreamResponse};
use crate::error::{ProxyError, Result};

// == Http Fetcher ==
/// Issues real GET requests with a per-request timeout.
///
/// Compressed bodies are decoded by reqwest, which also drops the
/// `content-encoding` header from the decoded response.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests fail with `ProxyError::Fetch` after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<UpstreamResponse> {
        let headers = build_headers(&request)?;
        debug!("GET {} query={:?} headers={:?}", request.url, request.query, request.headers);

        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .headers(headers)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response.bytes_stream().map_err(ProxyError::from);

        Ok(UpstreamResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

fn build_headers(request: &FetchRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ProxyError::InvalidRequest(format!("invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ProxyError::InvalidRequest(format!("invalid header value: {}", value)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
