use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::{
    ClockMetricsRecorder, CoreMetricsRecorder, WriteBackMetricsRecorder,
};

#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub get_hits: u64,
    pub get_misses: u64,
    pub set_new: u64,
    pub set_updates: u64,
    pub evicted_entries: u64,
    pub read_throughs: u64,
    pub write_backs: u64,
    pub write_back_failures: u64,
    pub flushes: u64,
    pub clears: u64,
    pub sweep_steps: u64,
    pub second_chances: u64,
}

impl CacheMetrics {
    /// Copies the counters and attaches the gauges supplied by the cache.
    pub fn snapshot(&self, cache_len: usize, dirty_len: usize, capacity: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            get_hits: self.get_hits,
            get_misses: self.get_misses,
            set_new: self.set_new,
            set_updates: self.set_updates,
            evicted_entries: self.evicted_entries,
            read_throughs: self.read_throughs,
            write_backs: self.write_backs,
            write_back_failures: self.write_back_failures,
            flushes: self.flushes,
            clears: self.clears,
            sweep_steps: self.sweep_steps,
            second_chances: self.second_chances,
            cache_len,
            dirty_len,
            capacity,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CoreMetricsRecorder for CacheMetrics {
    #[inline]
    fn record_get_hit(&mut self) {
        self.get_hits += 1;
    }

    #[inline]
    fn record_get_miss(&mut self) {
        self.get_misses += 1;
    }

    #[inline]
    fn record_set_new(&mut self) {
        self.set_new += 1;
    }

    #[inline]
    fn record_set_update(&mut self) {
        self.set_updates += 1;
    }

    #[inline]
    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    #[inline]
    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

impl WriteBackMetricsRecorder for CacheMetrics {
    #[inline]
    fn record_read_through(&mut self) {
        self.read_throughs += 1;
    }

    #[inline]
    fn record_write_back(&mut self) {
        self.write_backs += 1;
    }

    #[inline]
    fn record_write_back_failure(&mut self) {
        self.write_back_failures += 1;
    }

    #[inline]
    fn record_flush(&mut self) {
        self.flushes += 1;
    }
}

impl ClockMetricsRecorder for CacheMetrics {
    #[inline]
    fn record_sweep_step(&mut self) {
        self.sweep_steps += 1;
    }

    #[inline]
    fn record_second_chance(&mut self) {
        self.second_chances += 1;
    }
}
