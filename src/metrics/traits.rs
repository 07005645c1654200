//! # Metrics Trait Hierarchy
//!
//! Recording is split from snapshotting so policy code only ever sees the
//! narrow recorder it needs.
//!
//! ```text
//!                  ┌─────────────────────────────┐
//!                  │     CoreMetricsRecorder     │
//!                  │  get_hit/get_miss/set       │
//!                  │  evict/clear                │
//!                  └──────────────┬──────────────┘
//!                                 │
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │  WriteBackMetricsRecorder   │
//!                  │  write_back/failure/flush   │
//!                  └──────────────┬──────────────┘
//!                                 │
//!                                 ▼
//!                  ┌─────────────────────────────┐
//!                  │    ClockMetricsRecorder     │
//!                  │  sweep_step/second_chance   │
//!                  └─────────────────────────────┘
//! ```

/// Common counters for any cache policy.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_set_new(&mut self);
    fn record_set_update(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Counters for traffic between the cache and its base store.
pub trait WriteBackMetricsRecorder: CoreMetricsRecorder {
    fn record_read_through(&mut self);
    fn record_write_back(&mut self);
    fn record_write_back_failure(&mut self);
    fn record_flush(&mut self);
}

/// Metrics for CLOCK behavior (cursor sweep).
pub trait ClockMetricsRecorder: WriteBackMetricsRecorder {
    fn record_sweep_step(&mut self);
    fn record_second_chance(&mut self);
}

/// Snapshot provider for tests and benchmarks.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
