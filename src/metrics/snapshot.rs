/// Point-in-time copy of a cache's counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
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

    // CLOCK only
    pub sweep_steps: u64,
    pub second_chances: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub dirty_len: usize,
    pub capacity: usize,
}

impl CacheMetricsSnapshot {
    /// Fraction of `get` calls served without touching the base store.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.get_hits + self.get_misses;
        if total == 0 {
            0.0
        } else {
            self.get_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_no_traffic() {
        assert_eq!(CacheMetricsSnapshot::default().hit_ratio(), 0.0);
    }

    #[test]
    fn hit_ratio_counts_hits_over_gets() {
        let snapshot = CacheMetricsSnapshot {
            get_hits: 3,
            get_misses: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.hit_ratio(), 0.75);
    }
}
