//! HashMap-backed base store.
//!
//! ## Architecture
//! - Values are kept in an `FxHashMap<String, String>`.
//! - Every call bumps a counter so tests can observe read-through and
//!   write-back traffic.
//! - Writes can be made to fail, per key or globally, to exercise the
//!   caches' write-back error paths.
//!
//! ## Example Usage
//! ```rust
//! use kvs_cache::store::{BaseStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.set("a", "1").unwrap();
//! assert_eq!(store.get("a").unwrap(), "1");
//! assert_eq!(store.metrics().gets, 1);
//! ```
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::StoreError;
use crate::store::traits::{BaseStore, StoreMetrics};

/// In-memory [`BaseStore`] with call counters and write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: FxHashMap<String, String>,
    failing_keys: FxHashSet<String>,
    fail_all_writes: bool,
    metrics: StoreMetrics,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `pairs`. Seeding is not counted.
    pub fn with_entries<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Reads a value without touching the counters.
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Makes every subsequent `set` of `key` fail.
    pub fn fail_writes_for(&mut self, key: impl Into<String>) {
        self.failing_keys.insert(key.into());
    }

    /// Makes every subsequent `set` fail (or succeed again with `false`).
    pub fn fail_all_writes(&mut self, fail: bool) {
        self.fail_all_writes = fail;
    }

    /// Clears all injected write failures.
    pub fn heal(&mut self) {
        self.failing_keys.clear();
        self.fail_all_writes = false;
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = StoreMetrics::default();
    }
}

impl BaseStore for MemoryStore {
    fn get(&mut self, key: &str) -> Result<String, StoreError> {
        self.metrics.gets += 1;
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None => {
                self.metrics.failed_gets += 1;
                Err(StoreError::NotFound)
            },
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.metrics.sets += 1;
        if self.fail_all_writes || self.failing_keys.contains(key) {
            self.metrics.failed_sets += 1;
            return Err(StoreError::backend(format!("write of {key:?} rejected")));
        }
        self.data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_not_found() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound)));
        assert_eq!(store.metrics().gets, 1);
        assert_eq!(store.metrics().failed_gets, 1);
    }

    #[test]
    fn set_then_get_round_trips_and_counts() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), "2");
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.metrics(),
            StoreMetrics {
                gets: 1,
                sets: 2,
                failed_gets: 0,
                failed_sets: 0,
            }
        );
    }

    #[test]
    fn seeded_entries_are_not_counted() {
        let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(store.peek("b"), Some("2"));
        assert_eq!(store.metrics(), StoreMetrics::default());
    }

    #[test]
    fn injected_key_failure_leaves_value_untouched() {
        let mut store = MemoryStore::with_entries([("a", "old")]);
        store.fail_writes_for("a");
        assert!(matches!(store.set("a", "new"), Err(StoreError::Backend(_))));
        assert_eq!(store.peek("a"), Some("old"));
        store.set("b", "ok").unwrap();
        assert_eq!(store.metrics().failed_sets, 1);
    }

    #[test]
    fn fail_all_writes_and_heal() {
        let mut store = MemoryStore::new();
        store.fail_all_writes(true);
        assert!(store.set("x", "1").is_err());
        store.heal();
        store.set("x", "1").unwrap();
        assert_eq!(store.peek("x"), Some("1"));
    }

    #[test]
    fn boxed_and_borrowed_stores_delegate() {
        let mut store = MemoryStore::new();
        {
            let mut borrowed: &mut MemoryStore = &mut store;
            BaseStore::set(&mut borrowed, "a", "1").unwrap();
        }
        let mut boxed: Box<dyn BaseStore> = Box::new(store);
        assert_eq!(boxed.get("a").unwrap(), "1");
        assert_eq!(boxed.metrics().sets, 1);
    }
}
