//! Eviction Policy Module
//!
//! Element-count and byte-size budgets. Victims are always the globally
//! oldest entry by insertion time; reads never refresh an entry's age.

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// The two budgets a store must respect after every insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum number of entries
    pub max_elements: usize,
    /// Maximum sum of entry sizes
    pub max_bytes: usize,
}

impl EvictionPolicy {
    pub fn new(max_elements: usize, max_bytes: usize) -> Self {
        Self {
            max_elements,
            max_bytes,
        }
    }

    // == Count Bound ==
    /// True when adding one more entry to `len` entries would exceed the count budget.
    pub fn over_count(&self, len: usize) -> bool {
        len + 1 > self.max_elements
    }

    // == Byte Bound ==
    /// True when `incoming` bytes do not fit next to `stored` bytes.
    pub fn over_bytes(&self, stored: usize, incoming: usize) -> bool {
        stored + incoming > self.max_bytes
    }

    /// True when a single response can never fit, even in an empty store.
    pub fn oversized(&self, size: usize) -> bool {
        size > self.max_bytes
    }
}

// == Oldest Scan ==
/// Key of the entry with the smallest `(inserted_at, sequence)`.
///
/// Linear scan; fine for the tens-to-hundreds of entries this cache holds.
pub fn oldest_key<'a, I>(entries: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a String, &'a CacheEntry)>,
{
    entries
        .into_iter()
        .min_by_key(|(_, entry)| (entry.inserted_at, entry.sequence))
        .map(|(key, _)| key.clone())
}
