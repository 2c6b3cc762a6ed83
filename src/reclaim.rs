//! Lock-free invalidation of the soft tier.
//!
//! A [`ReclaimHandle`] is the cache's stand-in for a runtime memory manager
//! clearing softly-reachable objects. Calling [`ReclaimHandle::reclaim`]
//! bumps an atomic epoch without touching the cache lock; every soft entry
//! admitted under an earlier epoch is from then on reported as a miss and is
//! dropped by the next write operation.
//!
//! ```text
//!   memory-pressure signal ──► handle.reclaim() ──► epoch += 1
//!                                                      │
//!   get()  (shared lock)  ── soft entry epoch stale? ──┴─► miss
//!   put()  (exclusive)    ── purge stale soft entries ───► listener.on_soft_reclaimed
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cloneable handle that invalidates a cache's soft tier.
#[derive(Debug, Clone, Default)]
pub struct ReclaimHandle {
    epoch: Arc<AtomicU64>,
}

impl ReclaimHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every soft entry currently held by the owning cache.
    ///
    /// Safe to call from any thread, including while another thread holds
    /// the cache lock.
    pub fn reclaim(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the current reclaim epoch.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}
