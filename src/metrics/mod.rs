//! Operation counters for the write-back caches.
//!
//! Recorders only write counters, snapshot providers only read them. Every
//! policy owns a [`CacheMetrics`] and hands out [`CacheMetricsSnapshot`]s.

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use metrics_impl::CacheMetrics;
pub use snapshot::CacheMetricsSnapshot;
