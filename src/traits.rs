//! # Write-back Cache Contract
//!
//! Every eviction policy in this crate exposes the same contract, captured
//! by [`WriteBackCache`]. Code that only needs `get`/`set`/`flush` can be
//! written once and run against FIFO, LRU, or CLOCK.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────────────────┐
//!                    │          WriteBackCache                 │
//!                    │                                         │
//!                    │  get(&mut, &str) → Result<String>       │
//!                    │  set(&mut, &str, &str) → Result<()>     │
//!                    │  flush(&mut) → Result<()>               │
//!                    │  contains / peek / is_dirty             │
//!                    │  len / capacity / store / into_store    │
//!                    └──────────────────┬──────────────────────┘
//!                                       │
//!          ┌────────────────────────────┼────────────────────────────┐
//!          ▼                            ▼                            ▼
//!   ┌──────────────┐            ┌──────────────┐            ┌──────────────┐
//!   │  FifoCache   │            │   LruCache   │            │  ClockCache  │
//!   │ insertion    │            │ move to back │            │ cursor sweep │
//!   │ order        │            │ on touch     │            │ + ref bit    │
//!   └──────────────┘            └──────────────┘            └──────────────┘
//! ```
//!
//! ## Operation Flow
//!
//! ```text
//!   get(key) / set(key, value)
//!        │
//!        ▼
//!   resident? ── yes ──► policy touch, read or overwrite in place
//!        │
//!        no
//!        │
//!        ▼
//!   (get only) read through the base store ── missing ──► NotFound
//!        │
//!        ▼
//!   full? ── yes ──► evict one entry, write it back if dirty
//!        │
//!        ▼
//!   insert new entry (dirty for set, clean for get)
//! ```
//!
//! ## Thread Safety
//!
//! Implementations are single-threaded. Wrap one in
//! `SharedCache` (feature `concurrency`) to share it.

use crate::error::CacheError;
use crate::store::BaseStore;

/// Bounded write-back cache in front of a [`BaseStore`].
///
/// # Example
///
/// ```
/// use kvs_cache::policy::lru::LruCache;
/// use kvs_cache::store::MemoryStore;
/// use kvs_cache::traits::WriteBackCache;
///
/// fn warm<C: WriteBackCache>(cache: &mut C, keys: &[&str]) {
///     for key in keys {
///         let _ = cache.get(key);
///     }
/// }
///
/// let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
/// let mut cache = LruCache::new(store, 4).unwrap();
/// warm(&mut cache, &["a", "b", "c"]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait WriteBackCache {
    type Store: BaseStore;

    /// Returns a copy of the value for `key`, reading through the base store
    /// on a miss.
    ///
    /// Fails with [`CacheError::NotFound`] when neither the cache nor the
    /// store has the key; nothing is inserted in that case. Fails with
    /// [`CacheError::WriteBack`] when making room evicted a dirty entry the
    /// store refused; the fetched value is resident regardless.
    fn get(&mut self, key: &str) -> Result<String, CacheError>;

    /// Writes `value` for `key` into the cache. The base store only sees it
    /// once the entry is evicted or flushed.
    ///
    /// Fails with [`CacheError::WriteBack`] when making room evicted a dirty
    /// entry the store refused; the new value is resident regardless.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Writes back every dirty entry, then empties the cache.
    ///
    /// Keeps going past individual write failures and reports them together
    /// as [`CacheError::Flush`]. The cache is empty afterwards either way.
    fn flush(&mut self) -> Result<(), CacheError>;

    /// Returns `true` if `key` is resident. Does not count as a touch.
    fn contains(&self, key: &str) -> bool;

    /// Returns the resident value for `key` without touching it or reading
    /// through.
    fn peek(&self, key: &str) -> Option<&str>;

    /// Returns whether the resident entry for `key` is dirty, or `None` if
    /// it is not resident.
    fn is_dirty(&self, key: &str) -> Option<bool>;

    /// Number of resident entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident entries.
    fn capacity(&self) -> usize;

    fn store(&self) -> &Self::Store;

    /// Mutable access to the base store. Writing to it directly bypasses the
    /// cache; resident entries are not refreshed.
    fn store_mut(&mut self) -> &mut Self::Store;

    /// Tears the cache down and returns its base store.
    ///
    /// Resident entries are dropped without write-back; call
    /// [`flush`](Self::flush) first to keep dirty values.
    fn into_store(self) -> Self::Store
    where
        Self: Sized;
}
