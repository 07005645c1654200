//! kvs-cache: bounded write-back caches in front of a key-value store.
//!
//! A cache holds at most `capacity` string entries. Writes stay in the
//! cache (dirty) until the entry is evicted or [`flush`] is called; reads
//! that miss go through to the [`BaseStore`]. Three eviction policies share
//! the [`WriteBackCache`] contract:
//!
//! - [`FifoCache`]: evicts the oldest insertion
//! - [`LruCache`]: evicts the least recently used entry
//! - [`ClockCache`]: second-chance sweep over a reference bit
//!
//! ```
//! use kvs_cache::prelude::*;
//!
//! let mut cache = FifoCache::new(MemoryStore::new(), 2).unwrap();
//! cache.set("a", "1").unwrap();
//! cache.set("b", "2").unwrap();
//! cache.set("c", "3").unwrap(); // evicts "a" and writes it back
//!
//! assert_eq!(cache.store().peek("a"), Some("1"));
//! assert_eq!(cache.get("a").unwrap(), "1");
//! ```
//!
//! [`flush`]: traits::WriteBackCache::flush
//! [`BaseStore`]: store::BaseStore
//! [`WriteBackCache`]: traits::WriteBackCache
//! [`FifoCache`]: policy::FifoCache
//! [`LruCache`]: policy::LruCache
//! [`ClockCache`]: policy::ClockCache

pub mod builder;
pub mod ds;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod store;
#[cfg(feature = "concurrency")]
pub mod sync;
pub mod traits;
