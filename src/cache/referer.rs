//! Referer Resolver Module
//!
//! Recognizes requests made from a page this proxy served earlier, so the
//! upstream fetch can carry the Referer an unproxied browser would send.
//!
//! A proxied page lives at `/proxy/<host>/<rest>`. An image on that page
//! arrives with `Referer: http://localhost:5000/proxy/<host>/<rest>`, which
//! resolves to the upstream referer `http://<host>/<rest>`.

use url::Url;

/// First path segment of every proxied URL.
pub const PROXY_MARKER: &str = "proxy";

// == Proxy Referer ==
/// Upstream page a request was referred from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReferer {
    /// Upstream host, e.g. `example.com`
    pub host: String,
    /// Path after the host plus the query string, e.g. `search?q=x`
    pub path: String,
}

impl ProxyReferer {
    /// Referer header value to send upstream.
    pub fn upstream_referer(&self) -> String {
        format!("http://{}/{}", self.host, self.path)
    }

    /// Local proxy path for `path` on the same upstream host.
    ///
    /// Used to redirect server-relative links back through the proxy.
    pub fn proxied_path(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query {
            Some(q) if !q.is_empty() => format!("/{}/{}/{}?{}", PROXY_MARKER, self.host, path, q),
            _ => format!("/{}/{}/{}", PROXY_MARKER, self.host, path),
        }
    }
}

// == Resolve ==
/// Parses an inbound Referer header value.
///
/// Returns `None` when the header is absent, unparsable, or does not point
/// at a `/proxy/<host>/...` page.
pub fn resolve(referer: Option<&str>) -> Option<ProxyReferer> {
    let referer = Url::parse(referer?).ok()?;

    let rest = referer
        .path()
        .strip_prefix('/')?
        .strip_prefix(PROXY_MARKER)?
        .strip_prefix('/')?;

    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    if host.is_empty() {
        return None;
    }

    let path = match referer.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    Some(ProxyReferer {
        host: host.to_string(),
        path,
    })
}
