//! CLOCK (second-chance) write-back cache.
//!
//! Approximates LRU without reordering on every hit: a touch only sets a
//! reference bit, and the cursor sweeps the ring when room is needed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                         ClockCache<S> Layout                                │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  index: FxHashMap<String, SlotId>     (key -> ring node)            │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │  OrderList<CacheEntry>   (insertion order, read as a ring)          │   │
//! │   │                                                                     │   │
//! │   │   front                                              back           │   │
//! │   │   ┌───┐     ┌───┐     ┌───┐     ┌───┐     ┌───┐     ┌───┐           │   │
//! │   │   │ A │ ──► │ B │ ──► │ C │ ──► │ D │ ──► │ E │ ──► │ F │ ──┐       │   │
//! │   │   │ref│     │   │     │ref│     │   │     │ref│     │   │   │       │   │
//! │   │   └───┘     └───┘     └───┘     └───┘     └───┘     └───┘   │       │   │
//! │   │     ▲                   ▲                                   │       │   │
//! │   │     └───────────────────┼───────────────── wraps ───────────┘       │   │
//! │   │                         │                                           │   │
//! │   │                       cursor                                        │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! │                                                                             │
//! │   On hit:   set referenced bit (no list operations)                         │
//! │   On evict: sweep from cursor, clear bits, evict first unreferenced entry   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! GET(key) / SET(key, value) on a hit:
//!   1. Look up node in the index
//!   2. Set referenced = true (SET also overwrites and marks dirty)
//!
//! MISS (read-through on GET, new key on SET):
//!   1. If at capacity: run SWEEP, write the victim back if dirty
//!   2. Append the new entry at the back, unreferenced
//!   3. If the cursor is unset, point it at the new entry
//!
//! SWEEP:
//!   loop (at most 2 × len steps):
//!     entry = ring[cursor]
//!     if entry.referenced:
//!       entry.referenced = false      // second chance
//!       cursor = next(cursor) or front
//!     else:
//!       cursor = next(entry) or front (None if the ring is now empty)
//!       remove entry and return it
//! ```
//!
//! After one full lap every bit is clear, so the sweep always finds a victim
//! within `len + 1` steps. Exceeding `2 × len` means the ring is corrupt and
//! the sweep panics.
//!
//! ## Performance Characteristics
//!
//! | Operation | Time    | Notes                              |
//! |-----------|---------|------------------------------------|
//! | `get`     | O(1)*   | Hash lookup + bit set              |
//! | `set`     | O(1)*   | Amortized, eviction may sweep      |
//! | `flush`   | O(n)    | One store write per dirty entry    |
//! | `contains`| O(1)    | Hash lookup only                   |
//!
//! *Plus one base store call on a miss or a dirty eviction.
//!
//! ## Example Usage
//!
//! ```
//! use kvs_cache::policy::clock::ClockCache;
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::traits::WriteBackCache;
//!
//! let mut cache = ClockCache::new(MemoryStore::new(), 3).unwrap();
//! cache.set("a", "1").unwrap();
//! cache.set("b", "2").unwrap();
//! cache.set("c", "3").unwrap();
//!
//! // "a" gets a second chance; "b" is evicted instead
//! cache.get("a").unwrap();
//! cache.set("d", "4").unwrap();
//! assert!(cache.contains("a"));
//! assert!(!cache.contains("b"));
//! assert_eq!(cache.store().peek("b"), Some("2"));
//! ```
use tracing::trace;

use crate::ds::SlotId;
use crate::entry::{CacheEntry, DEFAULT_MAX_VALUE_LEN};
use crate::error::{CacheError, InvariantError};
use crate::metrics::traits::{
    ClockMetricsRecorder, CoreMetricsRecorder, MetricsSnapshotProvider, WriteBackMetricsRecorder,
};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::policy::resident::{ResidentSet, write_back_victim};
use crate::store::BaseStore;
use crate::traits::WriteBackCache;

/// Write-back cache using the CLOCK second-chance algorithm.
pub struct ClockCache<S: BaseStore> {
    resident: ResidentSet,
    cursor: Option<SlotId>,
    store: S,
    metrics: CacheMetrics,
}

impl<S: BaseStore> ClockCache<S> {
    /// Creates a CLOCK cache holding at most `capacity` entries.
    ///
    /// # Example
    ///
    /// ```
    /// use kvs_cache::policy::clock::ClockCache;
    /// use kvs_cache::store::MemoryStore;
    /// use kvs_cache::traits::WriteBackCache;
    ///
    /// let cache = ClockCache::new(MemoryStore::new(), 100).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.cursor_key().is_none());
    /// ```
    pub fn new(store: S, capacity: usize) -> Result<Self, CacheError> {
        Self::with_max_value_len(store, capacity, DEFAULT_MAX_VALUE_LEN)
    }

    /// Creates a CLOCK cache with an explicit maximum value length in bytes.
    pub fn with_max_value_len(
        store: S,
        capacity: usize,
        max_value_len: usize,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            resident: ResidentSet::new(capacity, max_value_len)?,
            cursor: None,
            store,
            metrics: CacheMetrics::default(),
        })
    }

    pub fn max_value_len(&self) -> usize {
        self.resident.max_value_len()
    }

    /// Resident keys in ring order, starting from the oldest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resident.keys()
    }

    /// Key of the entry the next sweep starts at.
    pub fn cursor_key(&self) -> Option<&str> {
        self.cursor
            .and_then(|id| self.resident.entry(id))
            .map(CacheEntry::key)
    }

    /// Reference bit of `key`, or `None` if it is not resident.
    pub fn is_referenced(&self, key: &str) -> Option<bool> {
        self.resident.peek(key).map(CacheEntry::is_referenced)
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

    /// Validates the ring, index, capacity bound, and cursor placement.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.resident.check_invariants()?;
        match self.cursor {
            None if self.resident.len() > 0 => Err(InvariantError::new(
                "cursor is unset on a non-empty ring",
            )),
            Some(_) if self.resident.len() == 0 => {
                Err(InvariantError::new("cursor is set on an empty ring"))
            },
            Some(id) if self.resident.entry(id).is_none() => Err(InvariantError::new(format!(
                "cursor points at vacant slot {}",
                id.index()
            ))),
            _ => Ok(()),
        }
    }

    /// Runs the clock hand until it finds an unreferenced entry and removes it.
    ///
    /// Returns `None` only when the ring is empty.
    fn sweep(&mut self) -> Option<CacheEntry> {
        let mut hand = self.cursor.or_else(|| self.resident.front_id())?;
        let max_steps = self.resident.len().saturating_mul(2);

        for _ in 0..max_steps {
            self.metrics.record_sweep_step();
            let referenced = self
                .resident
                .take_referenced(hand)
                .expect("clock hand points at a vacant slot");

            if referenced {
                self.metrics.record_second_chance();
                hand = self
                    .resident
                    .next_of(hand)
                    .or_else(|| self.resident.front_id())
                    .expect("clock ring emptied during sweep");
                continue;
            }

            let successor = self.resident.next_of(hand);
            let victim = self.resident.remove(hand);
            self.cursor = successor.or_else(|| self.resident.front_id());
            return victim;
        }

        panic!(
            "clock sweep found no victim in {max_steps} steps over {} entries",
            self.resident.len()
        );
    }

    fn admit(&mut self, entry: CacheEntry) -> Result<(), CacheError> {
        self.resident.reserve_one()?;
        let evicted = if self.resident.is_full() {
            let victim = self.sweep().expect("clock eviction on an empty ring");
            write_back_victim(&mut self.store, &mut self.metrics, victim)
        } else {
            Ok(())
        };
        let id = self.resident.push_back(entry);
        if self.cursor.is_none() {
            self.cursor = Some(id);
        }
        evicted
    }
}

impl<S: BaseStore> WriteBackCache for ClockCache<S> {
    type Store = S;

    fn get(&mut self, key: &str) -> Result<String, CacheError> {
        ResidentSet::check_key(key)?;
        if let Some(id) = self.resident.find(key) {
            self.resident.mark_referenced(id);
            self.metrics.record_get_hit();
            trace!(key, "clock get hit");
            let entry = self
                .resident
                .entry(id)
                .expect("indexed key has no ring node");
            return Ok(entry.value().to_owned());
        }

        self.metrics.record_get_miss();
        let value = self
            .store
            .get(key)
            .map_err(|error| CacheError::from_store_read(key, error))?;
        self.metrics.record_read_through();
        self.resident.check_value(&value)?;
        trace!(key, "clock get miss, filled from store");

        self.admit(CacheEntry::clean(key.to_owned(), value.clone()))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        ResidentSet::check_key(key)?;
        self.resident.check_value(value)?;

        if let Some(id) = self.resident.find(key) {
            self.resident.overwrite(id, value.to_owned());
            self.resident.mark_referenced(id);
            self.metrics.record_set_update();
            trace!(key, "clock set hit");
            return Ok(());
        }

        self.metrics.record_set_new();
        self.admit(CacheEntry::dirty(key.to_owned(), value.to_owned()))
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        self.cursor = None;
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

impl<S: BaseStore> MetricsSnapshotProvider<CacheMetricsSnapshot> for ClockCache<S> {
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics()
    }
}

impl<S: BaseStore> std::fmt::Debug for ClockCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockCache")
            .field("capacity", &self.resident.capacity())
            .field("len", &self.resident.len())
            .field("cursor", &self.cursor_key())
            .finish_non_exhaustive()
    }
}
