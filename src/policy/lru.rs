//! # Least Recently Used (LRU) Write-back Cache
//!
//! Evicts the entry that has gone longest without a read or a write. Every
//! hit moves the entry to the back of the recency list in O(1).
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LruCache<S>                                   │
//!   │                                                                          │
//!   │   ┌──────────────────────────────────────────────────────────────────┐   │
//!   │   │  FxHashMap<String, SlotId> (index into the recency list)         │   │
//!   │   │                                                                  │   │
//!   │   │  ┌─────────┬────────────────────────────────────────────┐        │   │
//!   │   │  │   Key   │  SlotId                                    │        │   │
//!   │   │  ├─────────┼────────────────────────────────────────────┤        │   │
//!   │   │  │  "a"    │  ────────────────────────────────────────┐ │        │   │
//!   │   │  │  "b"    │  ──────────────────────────────────┐     │ │        │   │
//!   │   │  │  "c"    │  ────────────────────────────┐     │     │ │        │   │
//!   │   │  └─────────┴──────────────────────────────┼─────┼─────┼─┘        │   │
//!   │   └───────────────────────────────────────────┼─────┼─────┼──────────┘   │
//!   │                                               │     │     │              │
//!   │   ┌───────────────────────────────────────────┼─────┼─────┼──────────┐   │
//!   │   │  OrderList<CacheEntry> (recency order)    ▼     ▼     ▼          │   │
//!   │   │                                                                  │   │
//!   │   │  front ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── back         │   │
//!   │   │    (LRU)   │  c   │      │  b*  │      │  a   │   (MRU)          │   │
//!   │   │            └──────┘      └──────┘      └──────┘                  │   │
//!   │   └──────────────────────────────────────────────────────────────────┘   │
//!   │                                                                          │
//!   │   store: S   (base store; written only on eviction and flush)           │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## LRU Operations Flow
//!
//! ```text
//!   SET new key (cache full)
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   Before:
//!     front ──► [C] ◄──► [B*] ◄──► [A] ◄── back    (capacity = 3)
//!               LRU                 MRU
//!
//!   set(D):
//!     1. Pop [C] from front; clean, so nothing to write
//!     2. Push [D*] at back
//!
//!   After:
//!     front ──► [B*] ◄──► [A] ◄──► [D*] ◄── back
//!
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   GET existing key
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   get(B):
//!     1. Find [B*] through the index: O(1)
//!     2. Move it to the back: O(1)
//!
//!   After:
//!     front ──► [A] ◄──► [D*] ◄──► [B*] ◄── back
//! ```
//!
//! ## Methods
//!
//! | Method             | Complexity | Description                               |
//! |--------------------|------------|-------------------------------------------|
//! | `get(k)`           | O(1)*      | Read, moves to MRU; may read through      |
//! | `set(k, v)`        | O(1)*      | Write, moves to MRU; may evict LRU        |
//! | `flush()`          | O(n)       | Write back dirty entries, empty the cache |
//! | `peek(k)`          | O(1)       | Read without affecting recency            |
//! | `touch(k)`         | O(1)       | Move to MRU without reading               |
//! | `peek_lru()`       | O(1)       | Next victim                               |
//! | `recency_rank(k)`  | O(n)       | Position in recency order (0 = MRU)       |
//!
//! *A base store call on a miss or a dirty eviction.
//!
//! ## Example Usage
//!
//! ```
//! use kvs_cache::policy::lru::LruCache;
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::traits::WriteBackCache;
//!
//! let mut cache = LruCache::new(MemoryStore::new(), 2).unwrap();
//! cache.set("a", "1").unwrap();
//! cache.set("b", "2").unwrap();
//! cache.get("a").unwrap();
//!
//! // "b" is now least recently used
//! cache.set("c", "3").unwrap();
//! assert!(!cache.contains("b"));
//! assert_eq!(cache.get("b").unwrap(), "2");
//! ```
use tracing::trace;

use crate::entry::{CacheEntry, DEFAULT_MAX_VALUE_LEN};
use crate::error::{CacheError, InvariantError};
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider, WriteBackMetricsRecorder};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::policy::resident::{ResidentSet, write_back_victim};
use crate::store::BaseStore;
use crate::traits::WriteBackCache;

/// Write-back cache evicting the least recently used entry.
pub struct LruCache<S: BaseStore> {
    resident: ResidentSet,
    store: S,
    metrics: CacheMetrics,
}

impl<S: BaseStore> LruCache<S> {
    /// Creates an LRU cache holding at most `capacity` entries.
    ///
    /// Fails with [`CacheError::InvalidArgument`] when `capacity` is zero.
    pub fn new(store: S, capacity: usize) -> Result<Self, CacheError> {
        Self::with_max_value_len(store, capacity, DEFAULT_MAX_VALUE_LEN)
    }

    /// Creates an LRU cache with an explicit maximum value length in bytes.
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

    pub fn max_value_len(&self) -> usize {
        self.resident.max_value_len()
    }

    /// Resident keys, least recently used first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resident.keys()
    }

    /// Returns the least recently used entry (the next victim).
    pub fn peek_lru(&self) -> Option<&CacheEntry> {
        self.resident.entries().next()
    }

    /// Marks `key` as most recently used without reading it.
    ///
    /// Returns `false` if `key` is not resident.
    pub fn touch(&mut self, key: &str) -> bool {
        match self.resident.find(key) {
            Some(id) => self.resident.move_to_back(id),
            None => false,
        }
    }

    /// Position of `key` in recency order, `0` being most recently used.
    pub fn recency_rank(&self, key: &str) -> Option<usize> {
        let rank_from_front = self.resident.keys().position(|k| k == key)?;
        Some(self.resident.len() - 1 - rank_from_front)
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

    /// Validates the recency list, index, and capacity bound.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.resident.check_invariants()
    }

    fn admit(&mut self, entry: CacheEntry) -> Result<(), CacheError> {
        self.resident.reserve_one()?;
        let evicted = if self.resident.is_full() {
            self.evict_lru()
        } else {
            Ok(())
        };
        self.resident.push_back(entry);
        evicted
    }

    fn evict_lru(&mut self) -> Result<(), CacheError> {
        let victim = self
            .resident
            .pop_front()
            .expect("LRU eviction on an empty recency list");
        write_back_victim(&mut self.store, &mut self.metrics, victim)
    }
}

impl<S: BaseStore> WriteBackCache for LruCache<S> {
    type Store = S;

    fn get(&mut self, key: &str) -> Result<String, CacheError> {
        ResidentSet::check_key(key)?;
        if let Some(id) = self.resident.find(key) {
            self.resident.move_to_back(id);
            self.metrics.record_get_hit();
            trace!(key, "lru get hit");
            let entry = self
                .resident
                .entry(id)
                .expect("indexed key has no list node");
            return Ok(entry.value().to_owned());
        }

        self.metrics.record_get_miss();
        let value = self
            .store
            .get(key)
            .map_err(|error| CacheError::from_store_read(key, error))?;
        self.metrics.record_read_through();
        self.resident.check_value(&value)?;
        trace!(key, "lru get miss, filled from store");

        self.admit(CacheEntry::clean(key.to_owned(), value.clone()))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        ResidentSet::check_key(key)?;
        self.resident.check_value(value)?;

        if let Some(id) = self.resident.find(key) {
            self.resident.overwrite(id, value.to_owned());
            self.resident.move_to_back(id);
            self.metrics.record_set_update();
            trace!(key, "lru set hit");
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

impl<S: BaseStore> MetricsSnapshotProvider<CacheMetricsSnapshot> for LruCache<S> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics()
    }
}

impl<S: BaseStore> std::fmt::Debug for LruCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.resident.capacity())
            .field("len", &self.resident.len())
            .finish_non_exhaustive()
    }
}
