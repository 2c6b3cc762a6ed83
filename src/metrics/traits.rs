//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting, and export are separate concerns:
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │   CacheMapMetricsRecorder    │  written by TieredCore / CacheMap
//!   │   gets, puts, pins, tier     │  (&self, both lock modes)
//!   │   transitions, lock timeouts │
//!   └──────────────┬───────────────┘
//!                  │
//!   ┌──────────────┴───────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! Recorders take `&self` because lookups resolved under the shared lock
//! record from several threads at once.

/// Counters for the tiered cache.
pub trait CacheMapMetricsRecorder {
    fn record_get_call(&self);
    fn record_get_pinned_hit(&self);
    fn record_get_primary_hit(&self);
    fn record_get_soft_hit(&self);
    fn record_get_miss(&self);

    fn record_put_call(&self);
    fn record_put_new(&self);
    fn record_put_update(&self);
    fn record_put_pinned(&self);

    fn record_remove_call(&self);
    fn record_remove_found(&self);

    fn record_pin_call(&self);
    fn record_pin_found(&self);
    fn record_unpin_call(&self);
    fn record_unpin_found(&self);

    fn record_primary_overflow(&self, demoted: bool);
    fn record_soft_overflow(&self);
    fn record_soft_promotion(&self);
    fn record_soft_reclaimed(&self, count: u64);

    fn record_lock_timeout(&self);
    fn record_clear(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&self);
}

/// Publishes snapshots to a monitoring backend.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
