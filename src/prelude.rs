pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::entry::{CacheEntry, DEFAULT_MAX_VALUE_LEN};
pub use crate::error::{CacheError, ConfigError, InvariantError, StoreError};
pub use crate::metrics::CacheMetricsSnapshot;
pub use crate::policy::{ClockCache, FifoCache, LruCache};
pub use crate::store::{BaseStore, MemoryStore, StoreMetrics};
#[cfg(feature = "concurrency")]
pub use crate::sync::SharedCache;
pub use crate::traits::WriteBackCache;
