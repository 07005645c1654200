//! Error types for the kvs-cache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by every public cache operation (`get`, `set`,
//!   `flush`, constructors).
//! - [`StoreError`]: Returned by [`BaseStore`](crate::store::BaseStore)
//!   implementations. Wrapped into [`CacheError`] when it crosses the cache
//!   boundary.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero capacity, unknown policy name).
//!
//! ## Write-back failures
//!
//! A [`CacheError::WriteBack`] means the triggering operation *did* complete
//! inside the cache (the victim was evicted and the new entry inserted), but
//! the victim's dirty value never reached the base store. The value is gone;
//! the error exists so the caller can observe the lost write, not retry it.
//!
//! ## Example Usage
//!
//! ```
//! use kvs_cache::error::CacheError;
//! use kvs_cache::policy::fifo::FifoCache;
//! use kvs_cache::store::MemoryStore;
//! use kvs_cache::traits::WriteBackCache;
//!
//! let mut cache = FifoCache::new(MemoryStore::new(), 2).unwrap();
//! let err = cache.get("missing").unwrap_err();
//! assert!(matches!(err, CacheError::NotFound { .. }));
//!
//! // Zero capacity is rejected without panicking
//! assert!(FifoCache::new(MemoryStore::new(), 0).is_err());
//! ```

use std::collections::TryReserveError;

use thiserror::Error;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Error returned by a [`BaseStore`](crate::store::BaseStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key has no value in the store.
    #[error("key not found")]
    NotFound,
    /// The store rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<T: ToString>(value: T) -> StoreError {
        StoreError::Backend(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reserving room for a new entry failed. Cache state is unchanged.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The key is resident nowhere: not in the cache, not in the base store.
    #[error("key {key:?} not found")]
    NotFound { key: String },

    /// The base store failed a read for a reason other than a missing key.
    #[error("base store read of {key:?} failed: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },

    /// A dirty victim could not be written back during eviction.
    ///
    /// The triggering operation still completed; only the victim's value was
    /// lost.
    #[error("write-back of evicted key {key:?} failed: {source}")]
    WriteBack {
        key: String,
        #[source]
        source: StoreError,
    },

    /// One or more dirty entries failed to write back during a flush.
    ///
    /// The cache is empty regardless.
    #[error("flush failed to write back {} key(s)", .failed.len())]
    Flush { failed: Vec<String> },

    /// Empty key, zero capacity, or similar.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The value exceeds the configured maximum length.
    #[error("value of {len} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { len: usize, max: usize },
}

impl CacheError {
    pub fn invalid<T: ToString>(value: T) -> CacheError {
        CacheError::InvalidArgument(value.to_string())
    }

    /// Returns `true` for [`CacheError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    /// Returns `true` when the triggering operation completed but a write-back
    /// was lost along the way.
    pub fn is_write_back(&self) -> bool {
        matches!(self, CacheError::WriteBack { .. })
    }

    pub(crate) fn from_store_read(key: &str, source: StoreError) -> CacheError {
        match source {
            StoreError::NotFound => CacheError::NotFound {
                key: key.to_owned(),
            },
            source => CacheError::Store {
                key: key.to_owned(),
                source,
            },
        }
    }
}

impl From<ConfigError> for CacheError {
    fn from(value: ConfigError) -> Self {
        CacheError::InvalidArgument(value.0)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on cache types
/// (e.g. [`ClockCache::check_invariants`](crate::policy::clock::ClockCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::build`](crate::builder::CacheBuilder::build)
/// validation and by parsing a [`CachePolicy`](crate::builder::CachePolicy)
/// from a string.
///
/// # Example
///
/// ```
/// use kvs_cache::builder::CachePolicy;
///
/// let err = "mru".parse::<CachePolicy>().unwrap_err();
/// assert!(err.to_string().contains("mru"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
