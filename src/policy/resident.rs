//! Resident-set bookkeeping and write-back shared by every policy.
//!
//! ```text
//!   ResidentSet
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ index: FxHashMap<String, SlotId>     key -> list node        │
//!   │ list:  OrderList<CacheEntry>         front = next victim     │
//!   │ dirty:  usize                        running dirty count     │
//!   │ capacity, max_value_len                                      │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Policies decide *which* entry leaves; this module makes sure it leaves
//! correctly: dirty victims go to the base store before they are dropped,
//! and a flush attempts every dirty entry before emptying the set.
use std::collections::TryReserveError;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::ds::{OrderList, SlotId};
use crate::entry::CacheEntry;
use crate::error::{CacheError, InvariantError};
use crate::metrics::traits::WriteBackMetricsRecorder;
use crate::store::BaseStore;

#[derive(Debug)]
pub(crate) struct ResidentSet {
    list: OrderList<CacheEntry>,
    index: FxHashMap<String, SlotId>,
    dirty: usize,
    capacity: usize,
    max_value_len: usize,
}

impl ResidentSet {
    pub(crate) fn new(capacity: usize, max_value_len: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::invalid("capacity must be > 0"));
        }
        if max_value_len == 0 {
            return Err(CacheError::invalid("max value length must be > 0"));
        }
        // Grows on demand; a huge capacity should not allocate up front.
        let prealloc = capacity.min(1024);
        let mut index = FxHashMap::default();
        index.try_reserve(prealloc)?;
        Ok(Self {
            list: OrderList::with_capacity(prealloc),
            index,
            dirty: 0,
            capacity,
            max_value_len,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn max_value_len(&self) -> usize {
        self.max_value_len
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.list.len() >= self.capacity
    }

    #[inline]
    pub(crate) fn dirty_len(&self) -> usize {
        self.dirty
    }

    #[inline]
    pub(crate) fn find(&self, key: &str) -> Option<SlotId> {
        self.index.get(key).copied()
    }

    pub(crate) fn peek(&self, key: &str) -> Option<&CacheEntry> {
        let id = self.find(key)?;
        self.list.get(id)
    }

    #[inline]
    pub(crate) fn entry(&self, id: SlotId) -> Option<&CacheEntry> {
        self.list.get(id)
    }

    /// Replaces the value at `id` and marks it dirty.
    pub(crate) fn overwrite(&mut self, id: SlotId, value: String) -> bool {
        let Some(entry) = self.list.get_mut(id) else {
            return false;
        };
        if !entry.is_dirty() {
            self.dirty += 1;
        }
        entry.overwrite(value);
        true
    }

    #[inline]
    pub(crate) fn mark_referenced(&mut self, id: SlotId) {
        if let Some(entry) = self.list.get_mut(id) {
            entry.set_referenced(true);
        }
    }

    /// Clears the reference bit at `id`, returning its previous state.
    pub(crate) fn take_referenced(&mut self, id: SlotId) -> Option<bool> {
        let entry = self.list.get_mut(id)?;
        let was = entry.is_referenced();
        entry.set_referenced(false);
        Some(was)
    }

    #[inline]
    pub(crate) fn front_id(&self) -> Option<SlotId> {
        self.list.front_id()
    }

    #[inline]
    pub(crate) fn next_of(&self, id: SlotId) -> Option<SlotId> {
        self.list.next_of(id)
    }

    #[inline]
    pub(crate) fn move_to_back(&mut self, id: SlotId) -> bool {
        self.list.move_to_back(id)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|(_, entry)| entry.key())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.list.iter().map(|(_, entry)| entry)
    }

    /// Rejects empty keys.
    pub(crate) fn check_key(key: &str) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::invalid("key must not be empty"));
        }
        Ok(())
    }

    /// Rejects values longer than the configured maximum.
    pub(crate) fn check_value(&self, value: &str) -> Result<(), CacheError> {
        if value.len() > self.max_value_len {
            return Err(CacheError::ValueTooLarge {
                len: value.len(),
                max: self.max_value_len,
            });
        }
        Ok(())
    }

    /// Makes the next [`push_back`](Self::push_back) infallible.
    ///
    /// Called before any eviction so that an allocation failure leaves the
    /// set untouched.
    pub(crate) fn reserve_one(&mut self) -> Result<(), TryReserveError> {
        self.list.try_reserve(1)?;
        self.index.try_reserve(1)
    }

    /// Appends `entry` at the back. The caller has already made room.
    pub(crate) fn push_back(&mut self, entry: CacheEntry) -> SlotId {
        debug_assert!(!self.is_full(), "push_back on a full resident set");
        debug_assert!(!self.index.contains_key(entry.key()), "duplicate key");
        let key = entry.key().to_owned();
        if entry.is_dirty() {
            self.dirty += 1;
        }
        let id = self.list.push_back(entry);
        self.index.insert(key, id);
        id
    }

    pub(crate) fn remove(&mut self, id: SlotId) -> Option<CacheEntry> {
        let entry = self.list.remove(id)?;
        self.index.remove(entry.key());
        if entry.is_dirty() {
            self.dirty -= 1;
        }
        Some(entry)
    }

    pub(crate) fn pop_front(&mut self) -> Option<CacheEntry> {
        let id = self.list.front_id()?;
        self.remove(id)
    }

    /// Writes every dirty entry back, then empties the set.
    ///
    /// Individual write failures do not stop the walk. Entries that were
    /// written are marked clean before they are dropped.
    pub(crate) fn flush<S, M>(&mut self, store: &mut S, metrics: &mut M) -> Result<(), CacheError>
    where
        S: BaseStore + ?Sized,
        M: WriteBackMetricsRecorder,
    {
        metrics.record_flush();
        let mut failed = Vec::new();
        let mut written = 0usize;
        let ids: Vec<SlotId> = self.list.iter().map(|(id, _)| id).collect();
        for id in ids {
            let Some(entry) = self.list.get_mut(id) else {
                continue;
            };
            if !entry.is_dirty() {
                continue;
            }
            match store.set(entry.key(), entry.value()) {
                Ok(()) => {
                    entry.mark_clean();
                    self.dirty -= 1;
                    metrics.record_write_back();
                    written += 1;
                },
                Err(error) => {
                    warn!(key = entry.key(), %error, "flush write-back failed");
                    metrics.record_write_back_failure();
                    failed.push(entry.key().to_owned());
                },
            }
        }

        let dropped = self.len();
        self.clear();
        metrics.record_clear();
        debug!(written, failed = failed.len(), dropped, "flushed resident set");

        if failed.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Flush { failed })
        }
    }

    pub(crate) fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
        self.dirty = 0;
    }

    #[cfg(test)]
    pub(crate) fn corrupt_len(&mut self, len: usize) {
        self.list.corrupt_len(len);
    }

    pub(crate) fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} resident entries exceed capacity {}",
                self.len(),
                self.capacity
            )));
        }
        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.index.len(),
                self.list.len()
            )));
        }
        let dirty = self.entries().filter(|entry| entry.is_dirty()).count();
        if dirty != self.dirty {
            return Err(InvariantError::new(format!(
                "dirty count is {} but {dirty} entries are dirty",
                self.dirty
            )));
        }
        for (id, entry) in self.list.iter() {
            if self.index.get(entry.key()) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "index does not point at the node for key {:?}",
                    entry.key()
                )));
            }
        }
        Ok(())
    }
}

/// Disposes of an evicted entry, writing it back first if it is dirty.
///
/// A failed write is logged and returned; the entry is dropped either way.
pub(crate) fn write_back_victim<S, M>(
    store: &mut S,
    metrics: &mut M,
    victim: CacheEntry,
) -> Result<(), CacheError>
where
    S: BaseStore + ?Sized,
    M: WriteBackMetricsRecorder,
{
    metrics.record_evicted_entry();
    if !victim.is_dirty() {
        debug!(key = victim.key(), "evicted clean entry");
        return Ok(());
    }
    match store.set(victim.key(), victim.value()) {
        Ok(()) => {
            metrics.record_write_back();
            debug!(key = victim.key(), "evicted dirty entry, written back");
            Ok(())
        },
        Err(source) => {
            metrics.record_write_back_failure();
            warn!(key = victim.key(), error = %source, "write-back of evicted entry failed, value lost");
            let (key, _) = victim.into_parts();
            Err(CacheError::WriteBack { key, source })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CacheMetrics;
    use crate::store::MemoryStore;

    fn dirty(key: &str, value: &str) -> CacheEntry {
        CacheEntry::dirty(key.to_owned(), value.to_owned())
    }

    fn clean(key: &str, value: &str) -> CacheEntry {
        CacheEntry::clean(key.to_owned(), value.to_owned())
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            ResidentSet::new(0, 16),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn push_find_remove_keep_index_in_sync() {
        let mut set = ResidentSet::new(3, 16).unwrap();
        set.reserve_one().unwrap();
        let a = set.push_back(dirty("a", "1"));
        set.reserve_one().unwrap();
        set.push_back(clean("b", "2"));

        assert_eq!(set.find("a"), Some(a));
        assert_eq!(set.peek("b").map(CacheEntry::value), Some("2"));
        assert_eq!(set.dirty_len(), 1);

        let removed = set.remove(a).unwrap();
        assert_eq!(removed.key(), "a");
        assert_eq!(set.find("a"), None);
        set.check_invariants().unwrap();
    }

    #[test]
    fn dirty_count_follows_every_transition() {
        let mut set = ResidentSet::new(4, 16).unwrap();
        set.reserve_one().unwrap();
        let a = set.push_back(clean("a", "1"));
        set.reserve_one().unwrap();
        let b = set.push_back(dirty("b", "2"));
        set.reserve_one().unwrap();
        set.push_back(clean("c", "3"));
        assert_eq!(set.dirty_len(), 1);

        assert!(set.overwrite(a, "10".to_owned()));
        assert_eq!(set.dirty_len(), 2);
        assert!(set.overwrite(a, "11".to_owned()));
        assert_eq!(set.dirty_len(), 2);
        set.check_invariants().unwrap();

        set.remove(b);
        assert_eq!(set.dirty_len(), 1);
        assert!(!set.overwrite(b, "x".to_owned()));
        assert_eq!(set.dirty_len(), 1);

        let mut store = MemoryStore::new();
        let mut metrics = CacheMetrics::default();
        set.flush(&mut store, &mut metrics).unwrap();
        assert_eq!(set.dirty_len(), 0);
        set.check_invariants().unwrap();
    }

    #[test]
    fn check_value_enforces_limit() {
        let set = ResidentSet::new(1, 3).unwrap();
        assert!(set.check_value("abc").is_ok());
        assert!(matches!(
            set.check_value("abcd"),
            Err(CacheError::ValueTooLarge { len: 4, max: 3 })
        ));
    }

    #[test]
    fn check_key_rejects_empty() {
        assert!(ResidentSet::check_key("").is_err());
        assert!(ResidentSet::check_key("k").is_ok());
    }

    #[test]
    fn write_back_victim_skips_clean_entries() {
        let mut store = MemoryStore::new();
        let mut metrics = CacheMetrics::default();
        write_back_victim(&mut store, &mut metrics, clean("a", "1")).unwrap();
        assert_eq!(store.metrics().sets, 0);
        assert_eq!(metrics.evicted_entries, 1);
        assert_eq!(metrics.write_backs, 0);
    }

    #[test]
    fn write_back_victim_persists_dirty_entries() {
        let mut store = MemoryStore::new();
        let mut metrics = CacheMetrics::default();
        write_back_victim(&mut store, &mut metrics, dirty("a", "1")).unwrap();
        assert_eq!(store.peek("a"), Some("1"));
        assert_eq!(metrics.write_backs, 1);
    }

    #[test]
    fn write_back_victim_reports_failure() {
        let mut store = MemoryStore::new();
        store.fail_writes_for("a");
        let mut metrics = CacheMetrics::default();
        let err = write_back_victim(&mut store, &mut metrics, dirty("a", "1")).unwrap_err();
        assert!(matches!(err, CacheError::WriteBack { ref key, .. } if key == "a"));
        assert_eq!(metrics.write_back_failures, 1);
    }

    #[test]
    fn flush_continues_past_failures_and_empties() {
        let mut set = ResidentSet::new(3, 16).unwrap();
        for entry in [dirty("a", "1"), dirty("b", "2"), clean("c", "3")] {
            set.reserve_one().unwrap();
            set.push_back(entry);
        }
        let mut store = MemoryStore::new();
        store.fail_writes_for("a");
        let mut metrics = CacheMetrics::default();

        let err = set.flush(&mut store, &mut metrics).unwrap_err();
        match err {
            CacheError::Flush { failed } => assert_eq!(failed, vec!["a".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.peek("b"), Some("2"));
        assert_eq!(store.peek("c"), None);
        assert_eq!(set.len(), 0);
        assert_eq!(metrics.write_backs, 1);
        assert_eq!(metrics.write_back_failures, 1);
        set.check_invariants().unwrap();
    }
}
