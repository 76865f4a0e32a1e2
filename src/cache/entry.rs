//! Cache Entry Module
//!
//! Defines a cached upstream response and its size accounting.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Body chunk size used when materializing upstream responses.
pub const CHUNK_SIZE: usize = 1024;

/// Header removed before storing; the cached body is already decoded.
pub const CONTENT_ENCODING: &str = "content-encoding";

// == Cache Entry ==
/// A complete upstream response as stored in the cache.
///
/// Entries are immutable; a refresh replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Target URL this response was fetched from
    pub url: String,
    /// Upstream status code
    pub status: u16,
    /// Body split into `CHUNK_SIZE` pieces (the last one may be shorter)
    pub body: Vec<Bytes>,
    /// Response headers without `content-encoding`
    pub headers: Vec<(String, String)>,
    /// Wall-clock insertion time
    pub inserted_at: DateTime<Utc>,
    /// Store-wide insertion counter, breaks `inserted_at` ties
    pub sequence: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds an entry stamped with the current time.
    ///
    /// Any `content-encoding` header is dropped, whatever its case.
    pub fn new(
        url: impl Into<String>,
        status: u16,
        body: Vec<Bytes>,
        headers: Vec<(String, String)>,
        sequence: u64,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            body,
            headers: strip_content_encoding(headers),
            inserted_at: Utc::now(),
            sequence,
        }
    }

    // == Size ==
    /// Bytes charged against the cache budget: body plus header names and values.
    pub fn size(&self) -> usize {
        response_size(&self.body, &self.headers)
    }

    /// Length of the body alone.
    pub fn body_len(&self) -> usize {
        self.body.iter().map(Bytes::len).sum()
    }

    /// Insertion time formatted for display.
    pub fn timestamp(&self) -> String {
        self.inserted_at.format("%Y-%m-%d %H:%M:%S %Z").to_string()
    }
}

// == Utility Functions ==
/// Size of a response as accounted by the cache.
pub fn response_size(body: &[Bytes], headers: &[(String, String)]) -> usize {
    let body_len: usize = body.iter().map(Bytes::len).sum();
    let header_len: usize = headers
        .iter()
        .map(|(name, value)| name.len() + value.len())
        .sum();
    body_len + header_len
}

/// Removes every `content-encoding` header.
pub fn strip_content_encoding(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers
        .into_iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_ENCODING))
        .collect()
}
