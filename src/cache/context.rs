//! Request Context Module
//!
//! The parts of an inbound request that influence an upstream fetch,
//! passed explicitly into the cache.

use std::collections::HashMap;

use url::form_urlencoded;

use crate::cache::referer;

// == Request Context ==
/// Inbound Referer and query parameters of the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw `Referer` header of the inbound request
    pub referer: Option<String>,
    /// Inbound query parameters, in request order
    pub query: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(referer: Option<String>, query: Vec<(String, String)>) -> Self {
        Self { referer, query }
    }

    /// Builds a context from a raw (still percent-encoded) query string.
    pub fn from_raw_query(referer: Option<String>, raw_query: Option<&str>) -> Self {
        let query = raw_query
            .map(|raw| form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { referer, query }
    }

    // == Cache Key ==
    /// Key under which the response for `url` is stored.
    ///
    /// The query string is part of the key so different queries never share
    /// an entry.
    pub fn cache_key(&self, url: &str) -> String {
        if self.query.is_empty() {
            return url.to_string();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{}", url, query)
    }

    // == Upstream Headers ==
    /// Headers for the upstream GET: a synthesized Referer when the request
    /// came from a page served through this proxy, nothing otherwise.
    pub fn upstream_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(resolved) = referer::resolve(self.referer.as_deref()) {
            headers.insert("Referer".to_string(), resolved.upstream_referer());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_without_query() {
        let ctx = RequestContext::default();
        assert_eq!(ctx.cache_key("http://example.com/a"), "http://example.com/a");
    }

    #[test]
    fn test_cache_key_with_query() {
        let ctx = RequestContext::from_raw_query(None, Some("q=rust+lang&page=2"));
        assert_eq!(
            ctx.query,
            vec![
                ("q".to_string(), "rust lang".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
        assert_eq!(
            ctx.cache_key("http://example.com/search"),
            "http://example.com/search?q=rust+lang&page=2"
        );
    }

    #[test]
    fn test_upstream_headers_from_proxied_referer() {
        let ctx = RequestContext::new(
            Some("http://localhost:5000/proxy/example.com/search?q=x".to_string()),
            Vec::new(),
        );

        let headers = ctx.upstream_headers();
        assert_eq!(
            headers.get("Referer").map(String::as_str),
            Some("http://example.com/search?q=x")
        );
    }

    #[test]
    fn test_upstream_headers_foreign_referer() {
        let ctx = RequestContext::new(Some("https://news.example.org/".to_string()), Vec::new());
        assert!(ctx.upstream_headers().is_empty());
        assert!(RequestContext::default().upstream_headers().is_empty());
    }
}
