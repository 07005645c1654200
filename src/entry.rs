//! Resident cache entry shared by every policy.
//!
//! ```text
//!   CacheEntry
//!   ┌───────────────────────────────┐
//!   │ key: String                   │
//!   │ value: String                 │
//!   │ dirty: bool                   │  newer than the base store
//!   │ referenced: bool              │  CLOCK second-chance bit
//!   └───────────────────────────────┘
//! ```
//!
//! FIFO and LRU carry `referenced` but never read it. Entries start
//! unreferenced; CLOCK sets the bit when an entry is touched.

/// Largest value, in bytes, a cache accepts unless configured otherwise.
pub const DEFAULT_MAX_VALUE_LEN: usize = 4096;

/// A key/value pair owned by exactly one cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    value: String,
    dirty: bool,
    referenced: bool,
}

impl CacheEntry {
    /// Entry filled from the base store on a read miss.
    pub fn clean(key: String, value: String) -> Self {
        Self {
            key,
            value,
            dirty: false,
            referenced: false,
        }
    }

    /// Entry created by a write; the base store has not seen this value yet.
    pub fn dirty(key: String, value: String) -> Self {
        Self {
            key,
            value,
            dirty: true,
            referenced: false,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_referenced(&self) -> bool {
        self.referenced
    }

    /// Replaces the value and marks the entry dirty.
    pub fn overwrite(&mut self, value: String) {
        self.value = value;
        self.dirty = true;
    }

    #[inline]
    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub(crate) fn set_referenced(&mut self, referenced: bool) {
        self.referenced = referenced;
    }

    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}
