use crate::metrics::cell::MetricsCell;
use crate::metrics::snapshot::CacheMapMetricsSnapshot;
use crate::metrics::traits::{CacheMapMetricsRecorder, MetricsReset, MetricsSnapshotProvider};

/// Counters shared by a [`CacheMap`](crate::cache_map::CacheMap) and its core.
#[derive(Debug, Default)]
pub struct CacheMapMetrics {
    pub get_calls: MetricsCell,
    pub get_pinned_hits: MetricsCell,
    pub get_primary_hits: MetricsCell,
    pub get_soft_hits: MetricsCell,
    pub get_misses: MetricsCell,
    pub put_calls: MetricsCell,
    pub put_new: MetricsCell,
    pub put_updates: MetricsCell,
    pub put_pinned: MetricsCell,
    pub remove_calls: MetricsCell,
    pub remove_found: MetricsCell,
    pub pin_calls: MetricsCell,
    pub pin_found: MetricsCell,
    pub unpin_calls: MetricsCell,
    pub unpin_found: MetricsCell,
    pub primary_overflows: MetricsCell,
    pub soft_demotions: MetricsCell,
    pub soft_overflows: MetricsCell,
    pub soft_promotions: MetricsCell,
    pub soft_reclaimed: MetricsCell,
    pub lock_timeouts: MetricsCell,
    pub clears: MetricsCell,
}

impl MetricsSnapshotProvider<CacheMapMetricsSnapshot> for CacheMapMetrics {
    /// Copies every counter into a snapshot; gauges are left at zero for the
    /// caller to fill in.
    fn snapshot(&self) -> CacheMapMetricsSnapshot {
        CacheMapMetricsSnapshot {
            get_calls: self.get_calls.get(),
            get_pinned_hits: self.get_pinned_hits.get(),
            get_primary_hits: self.get_primary_hits.get(),
            get_soft_hits: self.get_soft_hits.get(),
            get_misses: self.get_misses.get(),
            put_calls: self.put_calls.get(),
            put_new: self.put_new.get(),
            put_updates: self.put_updates.get(),
            put_pinned: self.put_pinned.get(),
            remove_calls: self.remove_calls.get(),
            remove_found: self.remove_found.get(),
            pin_calls: self.pin_calls.get(),
            pin_found: self.pin_found.get(),
            unpin_calls: self.unpin_calls.get(),
            unpin_found: self.unpin_found.get(),
            primary_overflows: self.primary_overflows.get(),
            soft_demotions: self.soft_demotions.get(),
            soft_overflows: self.soft_overflows.get(),
            soft_promotions: self.soft_promotions.get(),
            soft_reclaimed: self.soft_reclaimed.get(),
            lock_timeouts: self.lock_timeouts.get(),
            clears: self.clears.get(),
            ..CacheMapMetricsSnapshot::default()
        }
    }
}

impl CacheMapMetricsRecorder for CacheMapMetrics {
    fn record_get_call(&self) {
        self.get_calls.incr();
    }

    fn record_get_pinned_hit(&self) {
        self.get_pinned_hits.incr();
    }

    fn record_get_primary_hit(&self) {
        self.get_primary_hits.incr();
    }

    fn record_get_soft_hit(&self) {
        self.get_soft_hits.incr();
    }

    fn record_get_miss(&self) {
        self.get_misses.incr();
    }

    fn record_put_call(&self) {
        self.put_calls.incr();
    }

    fn record_put_new(&self) {
        self.put_new.incr();
    }

    fn record_put_update(&self) {
        self.put_updates.incr();
    }

    fn record_put_pinned(&self) {
        self.put_pinned.incr();
    }

    fn record_remove_call(&self) {
        self.remove_calls.incr();
    }

    fn record_remove_found(&self) {
        self.remove_found.incr();
    }

    fn record_pin_call(&self) {
        self.pin_calls.incr();
    }

    fn record_pin_found(&self) {
        self.pin_found.incr();
    }

    fn record_unpin_call(&self) {
        self.unpin_calls.incr();
    }

    fn record_unpin_found(&self) {
        self.unpin_found.incr();
    }

    fn record_primary_overflow(&self, demoted: bool) {
        self.primary_overflows.incr();
        if demoted {
            self.soft_demotions.incr();
        }
    }

    fn record_soft_overflow(&self) {
        self.soft_overflows.incr();
    }

    fn record_soft_promotion(&self) {
        self.soft_promotions.incr();
    }

    fn record_soft_reclaimed(&self, count: u64) {
        self.soft_reclaimed.add(count);
    }

    fn record_lock_timeout(&self) {
        self.lock_timeouts.incr();
    }

    fn record_clear(&self) {
        self.clears.incr();
    }
}

impl MetricsReset for CacheMapMetrics {
    fn reset_metrics(&self) {
        for cell in [
            &self.get_calls,
            &self.get_pinned_hits,
            &self.get_primary_hits,
            &self.get_soft_hits,
            &self.get_misses,
            &self.put_calls,
            &self.put_new,
            &self.put_updates,
            &self.put_pinned,
            &self.remove_calls,
            &self.remove_found,
            &self.pin_calls,
            &self.pin_found,
            &self.unpin_calls,
            &self.unpin_found,
            &self.primary_overflows,
            &self.soft_demotions,
            &self.soft_overflows,
            &self.soft_promotions,
            &self.soft_reclaimed,
            &self.lock_timeouts,
            &self.clears,
        ] {
            cell.reset();
        }
    }
}
