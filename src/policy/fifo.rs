//! First-In-First-Out (FIFO) write-back cache.
//!
//! Evicts entries in the order they were admitted. Reads and overwrites do
//! not extend an entry's stay: FIFO has no notion of recency.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FifoCache<S> Layout                             │
//! │                                                                         │
//! │   ┌─────────────────────────────────────────────────────────────────┐   │
//! │   │  index: FxHashMap<String, SlotId>                               │   │
//! │   └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │   ┌─────────────────────────────────────────────────────────────────┐   │
//! │   │  queue: OrderList<CacheEntry>                                   │   │
//! │   │                                                                 │   │
//! │   │   front ─► [A] ◄──► [B*] ◄──► [C] ◄──► [D*] ◄── back            │   │
//! │   │          oldest                        newest                   │   │
//! │   │                                 (* = dirty)                     │   │
//! │   └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │   store: S   (base store; written only on eviction and flush)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! SET(key, value):
//!   1. Resident: overwrite value, mark dirty, leave position alone
//!   2. Otherwise: if full, pop front (write back if dirty)
//!   3. Push dirty entry at back
//!
//! GET(key):
//!   1. Resident: return a copy, leave position alone
//!   2. Otherwise: read through the base store (NotFound → fail, no insert)
//!   3. If full, pop front (write back if dirty)
//!   4. Push clean entry at back, return value
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use kvs_cache::policy::fifo::FifoCache;
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::traits::WriteBackCache;
//!
//! let mut cache = FifoCache::new(MemoryStore::new(), 2).unwrap();
//! cache.set("a", "1").unwrap();
//! cache.set("b", "2").unwrap();
//!
//! // Reading "a" does not protect it
//! assert_eq!(cache.get("a").unwrap(), "1");
//! cache.set("c", "3").unwrap();
//!
//! assert!(!cache.contains("a"));
//! assert_eq!(cache.store().peek("a"), Some("1"));
//! ```
use tracing::trace;

use crate::entry::{CacheEntry, DEFAULT_MAX_VALUE_LEN};
use crate::error::{CacheError, InvariantError};
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider, WriteBackMetricsRecorder};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::policy::resident::{ResidentSet, write_back_victim};
use crate::store::BaseStore;
use crate::traits::WriteBackCache;

/// Write-back cache evicting in insertion order.
///
/// # Example
///
/// ```
/// use kvs_cache::policy::fifo::FifoCache;
/// use kvs_cache::store::MemoryStore;
/// use kvs_cache::traits::WriteBackCache;
///
/// let mut cache = FifoCache::new(MemoryStore::new(), 3).unwrap();
/// cache.set("k", "v").unwrap();
/// assert_eq!(cache.is_dirty("k"), Some(true));
///
/// cache.flush().unwrap();
/// assert!(cache.is_empty());
/// assert_eq!(cache.store().peek("k"), Some("v"));
/// ```
pub struct FifoCache<S: BaseStore> {
    resident: ResidentSet,
    store: S,
    metrics: CacheMetrics,
}

impl<S: BaseStore> FifoCache<S> {
    /// Creates a FIFO cache holding at most `capacity` entries.
    ///
    /// Fails with [`CacheError::InvalidArgument`] when `capacity` is zero.
    pub fn new(store: S, capacity: usize) -> Result<Self, CacheError> {
        Self::with_max_value_len(store, capacity, DEFAULT_MAX_VALUE_LEN)
    }

    /// Creates a FIFO cache with an explicit maximum value length in bytes.
    pub fn with_max_value_len(
        store: S,
        capacity: usize,
        max_value_len: usize,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            resident: ResidentSet::new(capacity, max_value_len)?,
            store,
            metrics: CacheMetrics::default(),
        })
    }

    /// Maximum accepted value length in bytes.
    pub fn max_value_len(&self) -> usize {
        self.resident.max_value_len()
    }

    /// Resident keys, oldest (next victim) first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resident.keys()
    }

    /// Returns the entry that would be evicted next.
    pub fn peek_oldest(&self) -> Option<&CacheEntry> {
        self.resident.entries().next()
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(
            self.resident.len(),
            self.resident.dirty_len(),
            self.resident.capacity(),
        )
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Validates the queue, index, and capacity bound.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.resident.check_invariants()
    }

    fn admit(&mut self, entry: CacheEntry) -> Result<(), CacheError> {
        self.resident.reserve_one()?;
        let evicted = if self.resident.is_full() {
            self.evict_oldest()
        } else {
            Ok(())
        };
        self.resident.push_back(entry);
        evicted
    }

    fn evict_oldest(&mut self) -> Result<(), CacheError> {
        let victim = self
            .resident
            .pop_front()
            .expect("FIFO eviction on an empty queue");
        write_back_victim(&mut self.store, &mut self.metrics, victim)
    }
}

impl<S: BaseStore> WriteBackCache for FifoCache<S> {
    type Store = S;

    fn get(&mut self, key: &str) -> Result<String, CacheError> {
        ResidentSet::check_key(key)?;
        if let Some(entry) = self.resident.peek(key) {
            self.metrics.record_get_hit();
            trace!(key, "fifo get hit");
            return Ok(entry.value().to_owned());
        }

        self.metrics.record_get_miss();
        let value = self
            .store
            .get(key)
            .map_err(|error| CacheError::from_store_read(key, error))?;
        self.metrics.record_read_through();
        self.resident.check_value(&value)?;
        trace!(key, "fifo get miss, filled from store");

        self.admit(CacheEntry::clean(key.to_owned(), value.clone()))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        ResidentSet::check_key(key)?;
        self.resident.check_value(value)?;

        if let Some(id) = self.resident.find(key) {
            self.resident.overwrite(id, value.to_owned());
            self.metrics.record_set_update();
            trace!(key, "fifo set hit");
            return Ok(());
        }

        self.metrics.record_set_new();
        self.admit(CacheEntry::dirty(key.to_owned(), value.to_owned()))
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        self.resident.flush(&mut self.store, &mut self.metrics)
    }

    fn contains(&self, key: &str) -> bool {
        self.resident.find(key).is_some()
    }

    fn peek(&self, key: &str) -> Option<&str> {
        self.resident.peek(key).map(CacheEntry::value)
    }

    fn is_dirty(&self, key: &str) -> Option<bool> {
        self.resident.peek(key).map(CacheEntry::is_dirty)
    }

    fn len(&self) -> usize {
        self.resident.len()
    }

    fn capacity(&self) -> usize {
        self.resident.capacity()
    }

    fn store(&self) -> &S {
        &self.store
    }

    fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn into_store(self) -> S {
        self.store
    }
}

impl<S: BaseStore> MetricsSnapshotProvider<CacheMetricsSnapshot> for FifoCache<S> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics()
    }
}

impl<S: BaseStore> std::fmt::Debug for FifoCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoCache")
            .field("capacity", &self.resident.capacity())
            .field("len", &self.resident.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache(capacity: usize) -> FifoCache<MemoryStore> {
        FifoCache::new(MemoryStore::new(), capacity).unwrap()
    }

    fn keys(cache: &FifoCache<MemoryStore>) -> Vec<&str> {
        cache.keys().collect()
    }

    mod basic_operations {
        use super::*;

        #[test]
        fn test_new_cache() {
            let cache = cache(10);
            assert_eq!(cache.capacity(), 10);
            assert_eq!(cache.len(), 0);
            assert!(cache.is_empty());
            assert_eq!(cache.max_value_len(), DEFAULT_MAX_VALUE_LEN);
        }

        #[test]
        fn test_set_and_get() {
            let mut cache = cache(10);
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();

            assert_eq!(cache.get("a").unwrap(), "1");
            assert_eq!(cache.get("b").unwrap(), "2");
            assert!(cache.get("c").unwrap_err().is_not_found());
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn test_set_marks_dirty_and_does_not_touch_store() {
            let mut cache = cache(4);
            cache.set("a", "1").unwrap();
            assert_eq!(cache.is_dirty("a"), Some(true));
            assert_eq!(cache.store().metrics().sets, 0);
            assert_eq!(cache.store().peek("a"), None);
        }

        #[test]
        fn test_overwrite_updates_in_place() {
            let mut cache = cache(4);
            cache.set("a", "1").unwrap();
            cache.set("a", "2").unwrap();
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.peek("a"), Some("2"));
        }

        #[test]
        fn test_read_through_fills_clean_entry() {
            let store = MemoryStore::with_entries([("a", "1")]);
            let mut cache = FifoCache::new(store, 4).unwrap();

            assert_eq!(cache.get("a").unwrap(), "1");
            assert_eq!(cache.is_dirty("a"), Some(false));
            assert_eq!(cache.get("a").unwrap(), "1");
            assert_eq!(cache.store().metrics().gets, 1);
        }

        #[test]
        fn test_miss_inserts_nothing() {
            let mut cache = cache(2);
            assert!(cache.get("ghost").is_err());
            assert!(cache.is_empty());
            assert!(!cache.contains("ghost"));
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn test_evicts_first_inserted() {
            let mut cache = cache(3);
            for (k, v) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
                cache.set(k, v).unwrap();
            }
            assert_eq!(keys(&cache), vec!["b", "c", "d"]);
            assert_eq!(cache.store().peek("a"), Some("1"));
        }

        #[test]
        fn test_reads_do_not_reorder() {
            let mut cache = cache(2);
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            cache.get("a").unwrap();
            cache.get("a").unwrap();
            cache.set("c", "3").unwrap();
            assert_eq!(keys(&cache), vec!["b", "c"]);
        }

        #[test]
        fn test_overwrite_does_not_reorder() {
            let mut cache = cache(2);
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            cache.set("a", "10").unwrap();
            cache.set("c", "3").unwrap();
            assert_eq!(keys(&cache), vec!["b", "c"]);
            assert_eq!(cache.store().peek("a"), Some("10"));
        }

        #[test]
        fn test_clean_victim_is_not_written() {
            let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
            let mut cache = FifoCache::new(store, 1).unwrap();
            cache.get("a").unwrap();
            cache.get("b").unwrap();
            assert_eq!(cache.store().metrics().sets, 0);
            assert_eq!(keys(&cache), vec!["b"]);
        }

        #[test]
        fn test_read_miss_evicts_dirty_front() {
            let store = MemoryStore::with_entries([("x", "9")]);
            let mut cache = FifoCache::new(store, 1).unwrap();
            cache.set("a", "1").unwrap();
            assert_eq!(cache.get("x").unwrap(), "9");
            assert_eq!(cache.store().peek("a"), Some("1"));
            assert_eq!(keys(&cache), vec!["x"]);
        }

        #[test]
        fn test_capacity_one() {
            let mut cache = cache(1);
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            assert!(!cache.contains("a"));
            assert!(cache.contains("b"));
            assert_eq!(cache.get("a").unwrap(), "1");
            assert_eq!(keys(&cache), vec!["a"]);
            assert_eq!(cache.store().peek("b"), Some("2"));
        }

        #[test]
        fn test_peek_oldest_tracks_front() {
            let mut cache = cache(2);
            assert!(cache.peek_oldest().is_none());
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            assert_eq!(cache.peek_oldest().map(CacheEntry::key), Some("a"));
        }
    }

    mod write_back_failures {
        use super::*;

        #[test]
        fn test_failed_eviction_still_inserts() {
            let mut cache = cache(1);
            cache.set("a", "1").unwrap();
            cache.store_mut().fail_writes_for("a");

            let err = cache.set("b", "2").unwrap_err();
            assert!(err.is_write_back());
            assert!(cache.contains("b"));
            assert!(!cache.contains("a"));
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.metrics().write_back_failures, 1);
        }

        #[test]
        fn test_failed_eviction_on_get_keeps_fetched_value() {
            let store = MemoryStore::with_entries([("x", "9")]);
            let mut cache = FifoCache::new(store, 1).unwrap();
            cache.set("a", "1").unwrap();
            cache.store_mut().fail_all_writes(true);

            assert!(cache.get("x").unwrap_err().is_write_back());
            assert_eq!(cache.peek("x"), Some("9"));
            assert_eq!(cache.is_dirty("x"), Some(false));
        }

        #[test]
        fn test_flush_reports_failure_and_empties() {
            let mut cache = cache(3);
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            cache.store_mut().fail_writes_for("a");

            let err = cache.flush().unwrap_err();
            assert!(matches!(err, CacheError::Flush { ref failed } if failed == &["a".to_string()]));
            assert!(cache.is_empty());
            assert_eq!(cache.store().peek("b"), Some("2"));
        }
    }

    mod flush {
        use super::*;

        #[test]
        fn test_flush_empty_is_ok() {
            let mut cache = cache(2);
            cache.flush().unwrap();
            assert!(cache.is_empty());
        }

        #[test]
        fn test_flush_writes_only_dirty() {
            let store = MemoryStore::with_entries([("r", "0")]);
            let mut cache = FifoCache::new(store, 4).unwrap();
            cache.get("r").unwrap();
            cache.set("w", "1").unwrap();

            cache.flush().unwrap();
            assert_eq!(cache.store().metrics().sets, 1);
            assert_eq!(cache.store().peek("w"), Some("1"));
            assert!(cache.is_empty());
        }

        #[test]
        fn test_cache_usable_after_flush() {
            let mut cache = cache(2);
            cache.set("a", "1").unwrap();
            cache.flush().unwrap();
            assert_eq!(cache.get("a").unwrap(), "1");
            assert_eq!(cache.is_dirty("a"), Some(false));
            cache.check_invariants().unwrap();
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_zero_capacity_rejected() {
            let err = FifoCache::new(MemoryStore::new(), 0).unwrap_err();
            assert!(matches!(err, CacheError::InvalidArgument(_)));
        }

        #[test]
        fn test_empty_key_rejected() {
            let mut cache = cache(2);
            assert!(matches!(cache.set("", "v"), Err(CacheError::InvalidArgument(_))));
            assert!(matches!(cache.get(""), Err(CacheError::InvalidArgument(_))));
            assert!(cache.is_empty());
        }

        #[test]
        fn test_oversized_value_rejected_without_change() {
            let mut cache = FifoCache::with_max_value_len(MemoryStore::new(), 2, 4).unwrap();
            cache.set("a", "1234").unwrap();
            let err = cache.set("a", "12345").unwrap_err();
            assert!(matches!(err, CacheError::ValueTooLarge { len: 5, max: 4 }));
            assert_eq!(cache.peek("a"), Some("1234"));
        }

        #[test]
        fn test_oversized_store_value_not_cached() {
            let store = MemoryStore::with_entries([("big", "xxxxxxxx")]);
            let mut cache = FifoCache::with_max_value_len(store, 2, 4).unwrap();
            assert!(matches!(cache.get("big"), Err(CacheError::ValueTooLarge { .. })));
            assert!(cache.is_empty());
        }

        #[test]
        fn test_into_store_returns_base() {
            let mut cache = cache(2);
            cache.set("a", "1").unwrap();
            cache.flush().unwrap();
            let store = cache.into_store();
            assert_eq!(store.peek("a"), Some("1"));
        }

        #[test]
        fn test_metrics_track_hits_and_misses() {
            let store = MemoryStore::with_entries([("a", "1")]);
            let mut cache = FifoCache::new(store, 2).unwrap();
            cache.get("a").unwrap();
            cache.get("a").unwrap();
            let _ = cache.get("b");
            let m = cache.metrics();
            assert_eq!(m.get_hits, 1);
            assert_eq!(m.get_misses, 2);
            assert_eq!(m.read_throughs, 1);
            assert_eq!(m.cache_len, 1);
        }

        #[test]
        fn test_debug_output() {
            let cache = cache(3);
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("FifoCache"));
            assert!(dbg.contains("capacity: 3"));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_eviction_follows_insertion_order(
                capacity in 1usize..8,
                count in 1usize..24,
            ) {
                let mut cache = cache(capacity);
                for i in 0..count {
                    cache.set(&format!("k{i}"), "v").unwrap();
                }
                let expected: Vec<String> = (count.saturating_sub(capacity)..count)
                    .map(|i| format!("k{i}"))
                    .collect();
                let resident: Vec<String> = cache.keys().map(str::to_owned).collect();
                prop_assert_eq!(resident, expected);
                cache.check_invariants().unwrap();
            }
        }
    }
}
