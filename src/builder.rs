//! Unified cache builder for all eviction policies.
//!
//! Picks a policy at runtime (from configuration, a CLI flag, ...) while
//! keeping one concrete cache type to pass around.
//!
//! ## Example
//!
//! ```rust
//! use kvs_cache::builder::{CacheBuilder, CachePolicy};
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::traits::WriteBackCache;
//!
//! let policy: CachePolicy = "clock".parse().unwrap();
//! let mut cache = CacheBuilder::new(100)
//!     .max_value_len(256)
//!     .build(policy, MemoryStore::new())
//!     .unwrap();
//! cache.set("k", "hello").unwrap();
//! assert_eq!(cache.get("k").unwrap(), "hello");
//! assert_eq!(cache.policy(), CachePolicy::Clock);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::entry::DEFAULT_MAX_VALUE_LEN;
use crate::error::{CacheError, ConfigError};
use crate::metrics::CacheMetricsSnapshot;
use crate::policy::clock::ClockCache;
use crate::policy::fifo::FifoCache;
use crate::policy::lru::LruCache;
use crate::store::BaseStore;
use crate::traits::WriteBackCache;

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// First In, First Out eviction.
    Fifo,
    /// Least Recently Used eviction.
    Lru,
    /// CLOCK (second-chance) eviction.
    Clock,
}

impl CachePolicy {
    pub const ALL: [CachePolicy; 3] = [CachePolicy::Fifo, CachePolicy::Lru, CachePolicy::Clock];

    pub fn as_str(self) -> &'static str {
        match self {
            CachePolicy::Fifo => "fifo",
            CachePolicy::Lru => "lru",
            CachePolicy::Clock => "clock",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = ConfigError;

    /// Parses a policy name, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        CachePolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "unknown cache policy {s:?}, expected one of: fifo, lru, clock"
                ))
            })
    }
}

/// Unified cache wrapper that provides a consistent API regardless of policy.
pub struct Cache<S: BaseStore> {
    inner: CacheInner<S>,
}

enum CacheInner<S: BaseStore> {
    Fifo(FifoCache<S>),
    Lru(LruCache<S>),
    Clock(ClockCache<S>),
}

macro_rules! dispatch {
    ($inner:expr, $cache:ident => $body:expr) => {
        match $inner {
            CacheInner::Fifo($cache) => $body,
            CacheInner::Lru($cache) => $body,
            CacheInner::Clock($cache) => $body,
        }
    };
}

impl<S: BaseStore> Cache<S> {
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Fifo(_) => CachePolicy::Fifo,
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Clock(_) => CachePolicy::Clock,
        }
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        dispatch!(&self.inner, cache => cache.metrics())
    }

    pub fn reset_metrics(&mut self) {
        dispatch!(&mut self.inner, cache => cache.reset_metrics())
    }

    /// Resident keys in the policy's internal order (next victim first for
    /// FIFO and LRU, ring order for CLOCK).
    pub fn keys(&self) -> Vec<&str> {
        dispatch!(&self.inner, cache => cache.keys().collect())
    }

    pub fn check_invariants(&self) -> Result<(), crate::error::InvariantError> {
        dispatch!(&self.inner, cache => cache.check_invariants())
    }
}

impl<S: BaseStore> WriteBackCache for Cache<S> {
    type Store = S;

    fn get(&mut self, key: &str) -> Result<String, CacheError> {
        dispatch!(&mut self.inner, cache => cache.get(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        dispatch!(&mut self.inner, cache => cache.set(key, value))
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        dispatch!(&mut self.inner, cache => cache.flush())
    }

    fn contains(&self, key: &str) -> bool {
        dispatch!(&self.inner, cache => cache.contains(key))
    }

    fn peek(&self, key: &str) -> Option<&str> {
        dispatch!(&self.inner, cache => cache.peek(key))
    }

    fn is_dirty(&self, key: &str) -> Option<bool> {
        dispatch!(&self.inner, cache => cache.is_dirty(key))
    }

    fn len(&self) -> usize {
        dispatch!(&self.inner, cache => cache.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(&self.inner, cache => cache.capacity())
    }

    fn store(&self) -> &S {
        dispatch!(&self.inner, cache => cache.store())
    }

    fn store_mut(&mut self) -> &mut S {
        dispatch!(&mut self.inner, cache => cache.store_mut())
    }

    fn into_store(self) -> S {
        dispatch!(self.inner, cache => cache.into_store())
    }
}

impl<S: BaseStore> fmt::Debug for Cache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy())
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    max_value_len: usize,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }

    /// Largest value, in bytes, the cache accepts. Defaults to
    /// [`DEFAULT_MAX_VALUE_LEN`].
    pub fn max_value_len(mut self, max_value_len: usize) -> Self {
        self.max_value_len = max_value_len;
        self
    }

    /// Build a cache with the specified policy in front of `store`.
    ///
    /// Fails with [`CacheError::InvalidArgument`] when the capacity or the
    /// maximum value length is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kvs_cache::builder::{CacheBuilder, CachePolicy};
    /// use kvs_cache::store::MemoryStore;
    ///
    /// let lru = CacheBuilder::new(100).build(CachePolicy::Lru, MemoryStore::new());
    /// assert!(lru.is_ok());
    ///
    /// let empty = CacheBuilder::new(0).build(CachePolicy::Fifo, MemoryStore::new());
    /// assert!(empty.is_err());
    /// ```
    pub fn build<S: BaseStore>(self, policy: CachePolicy, store: S) -> Result<Cache<S>, CacheError> {
        let (capacity, max_len) = (self.capacity, self.max_value_len);
        let inner = match policy {
            CachePolicy::Fifo => {
                CacheInner::Fifo(FifoCache::with_max_value_len(store, capacity, max_len)?)
            },
            CachePolicy::Lru => {
                CacheInner::Lru(LruCache::with_max_value_len(store, capacity, max_len)?)
            },
            CachePolicy::Clock => {
                CacheInner::Clock(ClockCache::with_max_value_len(store, capacity, max_len)?)
            },
        };

        Ok(Cache { inner })
    }
}
