//! Thread-safe wrapper for any write-back cache.
//!
//! ```text
//!   ┌───────────────────────────────────────────────┐
//!   │ SharedCache<C>  (Clone shares the same cache) │
//!   │                                               │
//!   │   Arc<Mutex<C>>                               │
//!   │          │                                    │
//!   │          ▼                                    │
//!   │   C: WriteBackCache  (FifoCache / LruCache /  │
//!   │                       ClockCache / Cache)     │
//!   └───────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes the lock once and holds it for the whole call,
//! including base store traffic. A mutex rather than a read/write lock is
//! used because even `get` reorders (LRU) or sets bits (CLOCK).
//!
//! | Method        | Lock  | Description                             |
//! |---------------|-------|-----------------------------------------|
//! | `get(k)`      | Mutex | Read, may read through and evict        |
//! | `set(k, v)`   | Mutex | Write, may evict                        |
//! | `flush()`     | Mutex | Write back dirty entries and empty      |
//! | `with(f)`     | Mutex | Run `f` with exclusive access           |
//!
//! ## Example
//!
//! ```
//! use kvs_cache::policy::lru::LruCache;
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::sync::SharedCache;
//!
//! let cache = SharedCache::new(LruCache::new(MemoryStore::new(), 64).unwrap());
//! let worker = cache.clone();
//! std::thread::spawn(move || worker.set("k", "v").unwrap())
//!     .join()
//!     .unwrap();
//! assert_eq!(cache.get("k").unwrap(), "v");
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CacheError;
use crate::traits::WriteBackCache;

/// Cloneable handle to a cache guarded by a single [`parking_lot::Mutex`].
pub struct SharedCache<C> {
    inner: Arc<Mutex<C>>,
}

impl<C: WriteBackCache> SharedCache<C> {
    pub fn new(cache: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn get(&self, key: &str) -> Result<String, CacheError> {
        self.inner.lock().get(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.inner.lock().set(key, value)
    }

    pub fn flush(&self) -> Result<(), CacheError> {
        self.inner.lock().flush()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Runs `f` with exclusive access to the cache, e.g. to inspect the base
    /// store or metrics without another thread interleaving.
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    /// Returns the cache if this is the last handle.
    pub fn try_unwrap(self) -> Result<C, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<C> Clone for SharedCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for SharedCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::policy::clock::ClockCache;
    use crate::store::MemoryStore;

    #[test]
    fn clones_share_one_cache() {
        let cache = SharedCache::new(ClockCache::new(MemoryStore::new(), 4).unwrap());
        let other = cache.clone();
        other.set("a", "1").unwrap();
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn try_unwrap_requires_last_handle() {
        let cache = SharedCache::new(ClockCache::new(MemoryStore::new(), 4).unwrap());
        let other = cache.clone();
        let cache = cache.try_unwrap().unwrap_err();
        drop(other);
        let inner = cache.try_unwrap().unwrap();
        assert!(inner.is_empty());
    }

    #[test]
    fn concurrent_writers_lose_nothing_after_flush() {
        let cache = SharedCache::new(ClockCache::new(MemoryStore::new(), 8).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        cache.set(&format!("t{t}-{i}"), &i.to_string()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        cache.flush().unwrap();
        cache.with(|inner| {
            assert_eq!(inner.store().len(), 200);
            assert_eq!(inner.store().peek("t3-49"), Some("49"));
        });
    }
}
