#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CacheMapMetricsSnapshot {
    pub get_calls: u64,
    pub get_pinned_hits: u64,
    pub get_primary_hits: u64,
    pub get_soft_hits: u64,
    pub get_misses: u64,

    pub put_calls: u64,
    pub put_new: u64,
    pub put_updates: u64,
    pub put_pinned: u64,

    pub remove_calls: u64,
    pub remove_found: u64,

    pub pin_calls: u64,
    pub pin_found: u64,
    pub unpin_calls: u64,
    pub unpin_found: u64,

    pub primary_overflows: u64,
    pub soft_demotions: u64, // overflows that landed in the soft tier
    pub soft_overflows: u64,
    pub soft_promotions: u64,
    pub soft_reclaimed: u64,

    pub lock_timeouts: u64,
    pub clears: u64,

    // gauges captured at snapshot time
    pub pinned_len: usize,
    pub primary_len: usize,
    pub soft_len: usize,
    pub cache_size: usize,
    pub soft_reference_size: usize,
}

impl CacheMapMetricsSnapshot {
    /// Hits across all three tiers.
    pub fn get_hits(&self) -> u64 {
        self.get_pinned_hits + self.get_primary_hits + self.get_soft_hits
    }

    /// Fraction of `get` calls that found a value, or `0.0` before any call.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.get_hits() + self.get_misses;
        if lookups == 0 {
            0.0
        } else {
            self.get_hits() as f64 / lookups as f64
        }
    }
}
