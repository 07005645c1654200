//! The base store contract.
//!
//! A base store is the persistent key-value layer the cache sits in front
//! of. The cache reads through it on a miss and writes dirty entries back to
//! it on eviction and flush; it never writes eagerly.
//!
//! Stores take `&mut self` so simple implementations can keep counters or
//! buffers without interior mutability. Any synchronisation belongs to the
//! store itself.

use crate::error::StoreError;

/// Snapshot of base store call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub gets: u64,
    pub sets: u64,
    pub failed_gets: u64,
    pub failed_sets: u64,
}

/// Persistent key-value provider consulted by the caches.
pub trait BaseStore {
    /// Fetch the value stored for `key`.
    ///
    /// Returns [`StoreError::NotFound`] when the key has never been written.
    fn get(&mut self, key: &str) -> Result<String, StoreError>;

    /// Persist `value` for `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Snapshot the store's call counters, if it keeps any.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}

impl<S: BaseStore + ?Sized> BaseStore for &mut S {
    fn get(&mut self, key: &str) -> Result<String, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn metrics(&self) -> StoreMetrics {
        (**self).metrics()
    }
}

impl<S: BaseStore + ?Sized> BaseStore for Box<S> {
    fn get(&mut self, key: &str) -> Result<String, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn metrics(&self) -> StoreMetrics {
        (**self).metrics()
    }
}
