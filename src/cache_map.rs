//! # Thread-Safe Tiered Cache
//!
//! [`CacheMap`] wraps a [`TieredCore`] in a single `parking_lot::RwLock` so the
//! pinned, primary, and soft tiers behave as one atomic map.
//!
//! ## Concurrency Model
//!
//! ```text
//!   Thread 1           Thread 2           Thread 3
//!      │                  │                  │
//!      │ get(k1)          │ contains_key(k2) │ put(k3)
//!      ▼                  ▼                  ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │          RwLock<TieredCore>  (try_*_for(timeout))        │
//!   │                                                          │
//!   │  get(): shared; re-acquires exclusive for an LRU touch   │
//!   │         or a soft-hit promotion                          │
//!   │  contains_key/contains_value/len/keys: shared            │
//!   │  put/remove/pin/unpin/put_all/clear/resize: exclusive    │
//!   │  every exclusive acquisition first purges reclaimed      │
//!   │  soft entries                                            │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every acquisition is bounded by the configured lock timeout. A caller that
//! cannot get the lock in time receives [`CacheError::LockTimeout`] and the
//! cache is left untouched. Guards are scoped, so the lock is released on
//! every exit path.
//!
//! ## Soft Reclamation
//!
//! [`CacheMap::reclaim_handle`] returns a [`ReclaimHandle`] that invalidates
//! the soft tier without taking the lock. Hook it to whatever signals memory
//! pressure in the embedding process.
//!
//! ## Example
//!
//! ```
//! use tiercache::builder::CacheMapBuilder;
//!
//! # fn main() -> Result<(), tiercache::error::CacheError> {
//! let cache = CacheMapBuilder::new()
//!     .lru(true)
//!     .cache_size(2)
//!     .soft_reference_size(2)
//!     .build::<&str, String>();
//!
//! cache.put("a", "alpha".to_string())?;
//! cache.put("b", "beta".to_string())?;
//! cache.get(&"a")?; // refresh "a"
//! cache.put("c", "gamma".to_string())?; // "b" overflows into the soft tier
//!
//! // Pinned entries are never evicted.
//! cache.pin("a")?;
//! for i in 0..100 {
//!     cache.put(if i % 2 == 0 { "x" } else { "y" }, i.to_string())?;
//! }
//! assert_eq!(cache.get(&"a")?.as_deref().map(String::as_str), Some("alpha"));
//! assert!(cache.unpin(&"a")?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::config::CacheMapConfig;
use crate::error::{CacheError, InvariantError, LockMode};
use crate::listener::EvictionListener;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CacheMapMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CacheMapMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CacheMapMetricsRecorder, MetricsReset, MetricsSnapshotProvider};
use crate::reclaim::ReclaimHandle;
use crate::tier::EvictionOrder;
use crate::tiered::{CoreOptions, Lookup, TieredCore};

type ReadGuard<'a, K, V> = RwLockReadGuard<'a, TieredCore<K, V>>;
type WriteGuard<'a, K, V> = RwLockWriteGuard<'a, TieredCore<K, V>>;

/// Thread-safe cache with a bounded primary tier, a pinned tier, and a soft
/// overflow tier.
///
/// Cloning a `CacheMap` yields another handle to the same cache.
pub struct CacheMap<K, V> {
    inner: Arc<RwLock<TieredCore<K, V>>>,
    order: EvictionOrder,
    lock_timeout: Duration,
    concurrency_level: usize,
    reclaim: ReclaimHandle,
    #[cfg(feature = "metrics")]
    metrics: Arc<CacheMapMetrics>,
}

impl<K, V> Clone for CacheMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            order: self.order,
            lock_timeout: self.lock_timeout,
            concurrency_level: self.concurrency_level,
            reclaim: self.reclaim.clone(),
            #[cfg(feature = "metrics")]
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Creates a cache from an already validated configuration.
    pub(crate) fn from_config(config: &CacheMapConfig) -> Self {
        let reclaim = ReclaimHandle::new();
        let options = CoreOptions {
            order: config.eviction_order(),
            cache_size: config.cache_size,
            soft_reference_size: config.soft_reference_size,
            soft_ttl: config.soft_ttl(),
            size_hint: config.size_hint(),
        };
        #[allow(unused_mut)]
        let mut core = TieredCore::with_reclaim(options, reclaim.clone());
        #[cfg(feature = "metrics")]
        let metrics = Arc::new(CacheMapMetrics::default());
        #[cfg(feature = "metrics")]
        core.set_metrics(Arc::clone(&metrics));

        CacheMap {
            inner: Arc::new(RwLock::new(core)),
            order: config.eviction_order(),
            lock_timeout: config.lock_timeout(),
            concurrency_level: config.concurrency_level,
            reclaim,
            #[cfg(feature = "metrics")]
            metrics,
        }
    }

    // -----------------------------------------------------------------------
    // Lock acquisition
    // -----------------------------------------------------------------------

    fn read(&self, operation: &'static str) -> Result<ReadGuard<'_, K, V>, CacheError> {
        self.inner
            .try_read_for(self.lock_timeout)
            .ok_or_else(|| self.timed_out(operation, LockMode::Shared))
    }

    fn write(&self, operation: &'static str) -> Result<WriteGuard<'_, K, V>, CacheError> {
        let mut core = self
            .inner
            .try_write_for(self.lock_timeout)
            .ok_or_else(|| self.timed_out(operation, LockMode::Exclusive))?;
        core.purge_soft();
        Ok(core)
    }

    fn timed_out(&self, operation: &'static str, mode: LockMode) -> CacheError {
        warn!(
            operation,
            %mode,
            timeout_ms = self.lock_timeout.as_millis() as u64,
            "cache lock acquisition timed out"
        );
        #[cfg(feature = "metrics")]
        self.metrics.record_lock_timeout();
        CacheError::LockTimeout {
            operation,
            mode,
            timeout: self.lock_timeout,
        }
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    /// Inserts or replaces `key`, returning the previous value from any tier.
    ///
    /// A pinned key is updated in place. Otherwise the entry is written to the
    /// primary tier, and the policy-selected victim overflows into the soft
    /// tier if the primary tier is full.
    pub fn put(&self, key: K, value: V) -> Result<Option<Arc<V>>, CacheError> {
        self.put_arc(key, Arc::new(value))
    }

    /// Same as [`put`](Self::put) for a value that is already shared.
    pub fn put_arc(&self, key: K, value: Arc<V>) -> Result<Option<Arc<V>>, CacheError> {
        let mut core = self.write("put")?;
        Ok(core.put(key, value))
    }

    /// Looks up `key` in the pinned, primary, then soft tier.
    ///
    /// A primary hit under LRU ordering refreshes recency; a soft hit is
    /// promoted back into the primary tier. Both take the exclusive lock.
    pub fn get(&self, key: &K) -> Result<Option<Arc<V>>, CacheError> {
        {
            let core = self.read("get")?;
            match core.lookup(key) {
                Lookup::Hit(value) => return Ok(Some(value)),
                Lookup::Miss => return Ok(None),
                Lookup::NeedsWrite => {},
            }
        }
        let mut core = self.write("get")?;
        Ok(core.get(key))
    }

    /// Removes `key` from whichever tier holds it and drops its pin
    /// registration.
    pub fn remove(&self, key: &K) -> Result<Option<Arc<V>>, CacheError> {
        let mut core = self.write("remove")?;
        Ok(core.remove(key))
    }

    /// Pins `key` so it is never evicted by capacity pressure.
    ///
    /// Returns `true` if the key had a value when pinned, `false` if it was
    /// pinned empty (a later `put` will land in the pinned tier).
    pub fn pin(&self, key: K) -> Result<bool, CacheError> {
        let mut core = self.write("pin")?;
        Ok(core.pin(key))
    }

    /// Drops the pin registration for `key`. A pinned value is demoted back
    /// into the primary tier. Returns whether the key was pinned.
    pub fn unpin(&self, key: &K) -> Result<bool, CacheError> {
        let mut core = self.write("unpin")?;
        Ok(core.unpin(key))
    }

    /// Returns `true` if `key` has a value in any tier.
    pub fn contains_key(&self, key: &K) -> Result<bool, CacheError> {
        let core = self.read("contains_key")?;
        Ok(core.contains_key(key))
    }

    /// Returns `true` if any tier holds a value equal to `value`. O(len).
    pub fn contains_value(&self, value: &V) -> Result<bool, CacheError>
    where
        V: PartialEq,
    {
        let core = self.read("contains_value")?;
        Ok(core.contains_value(value))
    }

    /// Copies every entry of `other` into this cache.
    ///
    /// Entries pinned in `other` are pinned here. With
    /// `replace_existing == false` keys that already have a value here keep
    /// it. `other` is snapshotted under its shared lock before this cache's
    /// exclusive lock is taken, so `a.put_all(&b)` and `b.put_all(&a)` can run
    /// concurrently.
    pub fn put_all(&self, other: &CacheMap<K, V>, replace_existing: bool) -> Result<(), CacheError> {
        let entries = other.read("put_all")?.entries();
        let mut core = self.write("put_all")?;
        core.put_all(entries, replace_existing);
        Ok(())
    }

    /// Empties every tier and drops every pin registration.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut core = self.write("clear")?;
        core.clear();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Number of keys with a visible value across all tiers.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.read("len")?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Returns `true` if `key` holds a pin registration.
    pub fn is_pinned(&self, key: &K) -> Result<bool, CacheError> {
        Ok(self.read("is_pinned")?.is_pinned(key))
    }

    /// Every pin registration, including keys pinned before any value.
    pub fn pinned_keys(&self) -> Result<Vec<K>, CacheError> {
        Ok(self.read("pinned_keys")?.pinned_keys())
    }

    /// Snapshot of all keys with a visible value (pinned, primary, soft).
    pub fn keys(&self) -> Result<Vec<K>, CacheError> {
        let core = self.read("keys")?;
        Ok(core.entries().into_iter().map(|(k, _, _)| k).collect())
    }

    /// Snapshot of all visible entries (pinned, primary, soft).
    pub fn entries(&self) -> Result<Vec<(K, Arc<V>)>, CacheError> {
        let core = self.read("entries")?;
        Ok(core.entries().into_iter().map(|(k, v, _)| (k, v)).collect())
    }

    /// Verifies the internal tier structure.
    pub fn check_invariants(&self) -> Result<Result<(), InvariantError>, CacheError> {
        Ok(self.read("check_invariants")?.check_invariants())
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    #[inline]
    pub fn eviction_order(&self) -> EvictionOrder {
        self.order
    }

    #[inline]
    pub fn is_lru(&self) -> bool {
        self.order.is_lru()
    }

    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    #[inline]
    pub fn concurrency_level(&self) -> usize {
        self.concurrency_level
    }

    pub fn cache_size(&self) -> Result<usize, CacheError> {
        Ok(self.read("cache_size")?.cache_size())
    }

    /// Resizes the primary tier. Surplus entries cascade into the soft tier
    /// in ejection order.
    pub fn set_cache_size(&self, cache_size: usize) -> Result<(), CacheError> {
        self.write("set_cache_size")?.set_cache_size(cache_size);
        Ok(())
    }

    pub fn soft_reference_size(&self) -> Result<usize, CacheError> {
        Ok(self.read("soft_reference_size")?.soft_reference_size())
    }

    /// Resizes the soft tier, dropping the oldest-demoted surplus. `0`
    /// disables the tier.
    pub fn set_soft_reference_size(&self, soft_reference_size: usize) -> Result<(), CacheError> {
        self.write("set_soft_reference_size")?
            .set_soft_reference_size(soft_reference_size);
        Ok(())
    }

    /// Installs (or with `None`, removes) the eviction listener.
    pub fn set_listener(
        &self,
        listener: Option<Arc<dyn EvictionListener<K, V>>>,
    ) -> Result<(), CacheError> {
        self.write("set_listener")?.set_listener(listener);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Soft reclamation
    // -----------------------------------------------------------------------

    /// Handle that invalidates the soft tier without taking the lock.
    pub fn reclaim_handle(&self) -> ReclaimHandle {
        self.reclaim.clone()
    }

    /// Drops reclaimed or expired soft entries now rather than on the next
    /// write. Returns how many were dropped.
    pub fn purge_soft(&self) -> Result<usize, CacheError> {
        let mut core = self
            .inner
            .try_write_for(self.lock_timeout)
            .ok_or_else(|| self.timed_out("purge_soft", LockMode::Exclusive))?;
        Ok(core.purge_soft())
    }
}

#[cfg(feature = "metrics")]
impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Counters plus tier gauges captured under the shared lock.
    pub fn metrics_snapshot(&self) -> Result<CacheMapMetricsSnapshot, CacheError> {
        let core = self.read("metrics_snapshot")?;
        let (pinned_len, primary_len, soft_len) = core.tier_lens();
        Ok(CacheMapMetricsSnapshot {
            pinned_len,
            primary_len,
            soft_len,
            cache_size: core.cache_size(),
            soft_reference_size: core.soft_reference_size(),
            ..self.metrics.snapshot()
        })
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset_metrics();
    }
}

impl<K, V> fmt::Debug for CacheMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("CacheMap");
        dbg.field("order", &self.order)
            .field("lock_timeout", &self.lock_timeout);
        match self.inner.try_read() {
            Some(core) => dbg.field("core", &*core),
            None => dbg.field("core", &"<locked>"),
        };
        dbg.finish_non_exhaustive()
    }
}
