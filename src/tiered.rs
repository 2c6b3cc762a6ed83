//! # Tiered Cache Core
//!
//! Single-threaded state behind [`CacheMap`](crate::cache_map::CacheMap):
//! the pinned, primary, and soft tiers over one key space, plus the rules
//! that move entries between them.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          TieredCore<K, V>                            │
//!   │                                                                      │
//!   │   ┌──────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//!   │   │ PinnedTier   │   │ PrimaryTier          │   │ SoftTier        │  │
//!   │   │ K -> Option  │   │ LinkedIndex (LRU or  │   │ LinkedIndex     │  │
//!   │   │   <Arc<V>>   │   │ FIFO), ≤ cache_size  │   │ (demotion order)│  │
//!   │   │ unbounded    │   │                      │   │ ≤ soft_ref_size │  │
//!   │   └──────┬───────┘   └──────────┬───────────┘   └────────┬────────┘  │
//!   │          │   pin ◄──────────────┤                        │           │
//!   │          │   pin ◄───────────────────────────────────────┤           │
//!   │          └─ unpin ─────────────►│ overflow ─────────────►│──► drop   │
//!   │                                 │◄───────── soft hit promotion       │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction Cascade
//!
//! ```text
//!   put(k, v)            primary full?         soft full?
//!   ─────────► primary ───────yes──────► soft ─────yes─────► drop oldest
//!                 │                        (victim chosen by LRU/FIFO)
//!                 no
//!                 ▼
//!               done
//! ```
//!
//! A key holds a value in at most one tier. `put` on a key whose value sits
//! in the soft tier removes the soft copy before writing to primary.
//!
//! ## Lookup Order
//!
//! `get`, `contains_key` and `remove` consult pinned → primary → soft.
//! A pinned-empty registration answers `get` as a miss.
//!
//! ## Thread Safety
//!
//! `TieredCore` is **not** thread-safe on its own. `CacheMap` wraps it in a
//! `parking_lot::RwLock`; `&self` methods are safe to call under the shared
//! lock, `&mut self` methods need the exclusive lock.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::InvariantError;
use crate::listener::SharedListener;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CacheMapMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::traits::CacheMapMetricsRecorder;
use crate::reclaim::ReclaimHandle;
use crate::tier::pinned::PinnedTier;
use crate::tier::primary::{EvictionOrder, Insertion, PrimaryTier};
use crate::tier::soft::SoftTier;

/// Tier a lookup was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Pinned,
    Primary,
    Soft,
}

/// Outcome of a lookup that may not mutate.
#[derive(Debug)]
pub enum Lookup<V> {
    /// Resolved without any state change.
    Hit(Arc<V>),
    /// Not present in any tier (or pinned-empty).
    Miss,
    /// Present, but serving it requires a recency update or a promotion.
    NeedsWrite,
}

/// Sizing and behaviour of a [`TieredCore`].
#[derive(Debug, Clone)]
pub struct CoreOptions {
    pub order: EvictionOrder,
    pub cache_size: usize,
    pub soft_reference_size: usize,
    pub soft_ttl: Option<Duration>,
    /// Upper bound on initial map allocation.
    pub size_hint: usize,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            order: EvictionOrder::Fifo,
            cache_size: 1000,
            soft_reference_size: 1000,
            soft_ttl: None,
            size_hint: 1024,
        }
    }
}

/// Pinned, primary, and soft tiers plus the transitions between them.
pub struct TieredCore<K, V> {
    pinned: PinnedTier<K, V>,
    primary: PrimaryTier<K, V>,
    soft: SoftTier<K, V>,
    listener: Option<SharedListener<K, V>>,
    #[cfg(feature = "metrics")]
    metrics: Arc<CacheMapMetrics>,
}

impl<K, V> TieredCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a core with its own reclaim handle.
    ///
    /// # Example
    ///
    /// ```
    /// use tiercache::tiered::{CoreOptions, TieredCore};
    /// use tiercache::tier::EvictionOrder;
    ///
    /// let mut core: TieredCore<&str, i32> = TieredCore::new(CoreOptions {
    ///     order: EvictionOrder::Lru,
    ///     cache_size: 1,
    ///     soft_reference_size: 1,
    ///     ..Default::default()
    /// });
    /// core.put("a", 1.into());
    /// core.put("b", 2.into()); // "a" overflows into the soft tier
    /// assert_eq!(core.get(&"a").map(|v| *v), Some(1));
    /// ```
    pub fn new(options: CoreOptions) -> Self {
        Self::with_reclaim(options, ReclaimHandle::new())
    }

    /// Creates a core whose soft tier is invalidated through `reclaim`.
    pub fn with_reclaim(options: CoreOptions, reclaim: ReclaimHandle) -> Self {
        Self {
            pinned: PinnedTier::new(options.size_hint.min(64)),
            primary: PrimaryTier::new(options.cache_size, options.order, options.size_hint),
            soft: SoftTier::new(
                options.soft_reference_size,
                options.soft_ttl,
                reclaim,
                options.size_hint,
            ),
            listener: None,
            #[cfg(feature = "metrics")]
            metrics: Arc::default(),
        }
    }

    pub(crate) fn set_listener(&mut self, listener: Option<SharedListener<K, V>>) {
        self.listener = listener;
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn set_metrics(&mut self, metrics: Arc<CacheMapMetrics>) {
        self.metrics = metrics;
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    #[inline]
    pub fn eviction_order(&self) -> EvictionOrder {
        self.primary.order()
    }

    #[inline]
    pub fn cache_size(&self) -> usize {
        self.primary.capacity()
    }

    #[inline]
    pub fn soft_reference_size(&self) -> usize {
        self.soft.capacity()
    }

    // -----------------------------------------------------------------------
    // Reads (shared lock)
    // -----------------------------------------------------------------------

    /// Resolves `key` without mutating, reporting when mutation is required.
    ///
    /// A resolved lookup is recorded as one `get` call; a `NeedsWrite`
    /// outcome is recorded by the follow-up [`get`](Self::get).
    pub fn lookup(&self, key: &K) -> Lookup<V> {
        if let Some(slot) = self.pinned.slot(key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_call();
            return match slot {
                Some(value) => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_get_pinned_hit();
                    Lookup::Hit(Arc::clone(value))
                },
                None => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_get_miss();
                    Lookup::Miss
                },
            };
        }

        if let Some(value) = self.primary.peek(key) {
            if self.primary.order().is_lru() {
                return Lookup::NeedsWrite;
            }
            #[cfg(feature = "metrics")]
            {
                self.metrics.record_get_call();
                self.metrics.record_get_primary_hit();
            }
            return Lookup::Hit(Arc::clone(value));
        }

        if self.soft.contains_key(key, Instant::now()) {
            return Lookup::NeedsWrite;
        }

        #[cfg(feature = "metrics")]
        {
            self.metrics.record_get_call();
            self.metrics.record_get_miss();
        }
        Lookup::Miss
    }

    /// Returns `true` if `key` has a value in any tier.
    pub fn contains_key(&self, key: &K) -> bool {
        self.pinned.value(key).is_some()
            || self.primary.contains_key(key)
            || self.soft.contains_key(key, Instant::now())
    }

    /// Returns `true` if any tier holds a value equal to `value`. O(len).
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let now = Instant::now();
        self.pinned.iter_valued().any(|(_, v)| **v == *value)
            || self.primary.iter().any(|(_, v)| **v == *value)
            || self.soft.iter_live(now).any(|(_, v)| **v == *value)
    }

    /// Returns `true` if `key` holds a pin registration.
    #[inline]
    pub fn is_pinned(&self, key: &K) -> bool {
        self.pinned.is_pinned(key)
    }

    /// Number of keys with a visible value across all tiers.
    pub fn len(&self) -> usize {
        self.pinned.valued_len() + self.primary.len() + self.soft.live_len(Instant::now())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-tier sizes: `(pinned with value, primary, visible soft)`.
    pub fn tier_lens(&self) -> (usize, usize, usize) {
        (
            self.pinned.valued_len(),
            self.primary.len(),
            self.soft.live_len(Instant::now()),
        )
    }

    /// Every pin registration, including pinned-empty ones.
    pub fn pinned_keys(&self) -> Vec<K> {
        self.pinned.keys().cloned().collect()
    }

    /// Visible entries in tier order pinned → primary → soft, tagged with
    /// their tier.
    pub fn entries(&self) -> Vec<(K, Arc<V>, Tier)> {
        let now = Instant::now();
        let pinned = self
            .pinned
            .iter_valued()
            .map(|(k, v)| (k.clone(), Arc::clone(v), Tier::Pinned));
        let primary = self
            .primary
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v), Tier::Primary));
        let soft = self
            .soft
            .iter_live(now)
            .map(|(k, v)| (k.clone(), Arc::clone(v), Tier::Soft));
        pinned.chain(primary).chain(soft).collect()
    }

    // -----------------------------------------------------------------------
    // Writes (exclusive lock)
    // -----------------------------------------------------------------------

    /// Looks up `key`, refreshing LRU recency or promoting a soft hit back
    /// into the primary tier.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_get_call();

        if let Some(slot) = self.pinned.slot(key) {
            #[cfg(feature = "metrics")]
            match slot {
                Some(_) => self.metrics.record_get_pinned_hit(),
                None => self.metrics.record_get_miss(),
            }
            return slot.cloned();
        }

        if let Some(value) = self.primary.get(key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_primary_hit();
            return Some(Arc::clone(value));
        }

        let now = Instant::now();
        match self.soft.take(key, now) {
            Some(value) => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.record_get_soft_hit();
                    self.metrics.record_soft_promotion();
                }
                trace!("promoting soft hit into primary tier");
                self.insert_primary(key.clone(), Arc::clone(&value), now);
                Some(value)
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                None
            },
        }
    }

    /// Inserts or replaces `key`, returning the previous value from any tier.
    ///
    /// A pinned key (with or without a value) is updated in place and no
    /// eviction is considered. Otherwise the value goes to the primary tier
    /// and may trigger the eviction cascade.
    pub fn put(&mut self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_put_call();

        let value = match self.pinned.replace(&key, value) {
            Ok(previous) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_put_pinned();
                return previous;
            },
            Err(value) => value,
        };

        let now = Instant::now();
        let soft_previous = self.soft.take(&key, now);
        let previous = self.insert_primary(key, value, now).or(soft_previous);

        #[cfg(feature = "metrics")]
        if previous.is_some() {
            self.metrics.record_put_update();
        } else {
            self.metrics.record_put_new();
        }
        previous
    }

    /// Removes `key` from whichever tier holds it and drops its pin
    /// registration.
    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let pinned = self.pinned.unpin(key).flatten();
        let primary = self.primary.remove(key);
        let soft = self.soft.take(key, Instant::now());
        let removed = pinned.or(primary).or(soft);

        #[cfg(feature = "metrics")]
        if removed.is_some() {
            self.metrics.record_remove_found();
        }
        removed
    }

    /// Pins `key`, moving any existing value out of the primary or soft tier.
    ///
    /// Returns `true` if the key had a value at the moment of pinning and
    /// `false` if it was pinned empty. Pinning twice is a no-op for the pin
    /// state.
    pub fn pin(&mut self, key: K) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_pin_call();

        let found = if let Some(slot) = self.pinned.slot(&key) {
            slot.is_some()
        } else {
            let value = match self.primary.remove(&key) {
                Some(value) => Some(value),
                None => self.soft.take(&key, Instant::now()),
            };
            let found = value.is_some();
            trace!(found, "pinning key");
            self.pinned.pin(key, value);
            found
        };

        #[cfg(feature = "metrics")]
        if found {
            self.metrics.record_pin_found();
        }
        found
    }

    /// Clears the pin registration for `key`, demoting a pinned value back
    /// into the primary tier. Returns whether the key was pinned.
    pub fn unpin(&mut self, key: &K) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_unpin_call();

        let Some(slot) = self.pinned.unpin(key) else {
            return false;
        };
        if let Some(value) = slot {
            trace!("demoting unpinned value into primary tier");
            self.insert_primary(key.clone(), value, Instant::now());
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_unpin_found();
        true
    }

    /// Copies `entries` (as produced by [`entries`](Self::entries) on another
    /// cache) into this one.
    ///
    /// Entries that were pinned at the source are pinned here. With
    /// `replace_existing == false`, keys that already have a value here are
    /// skipped.
    pub fn put_all<I>(&mut self, entries: I, replace_existing: bool)
    where
        I: IntoIterator<Item = (K, Arc<V>, Tier)>,
    {
        for (key, value, tier) in entries {
            if !replace_existing && self.contains_key(&key) {
                continue;
            }
            if tier == Tier::Pinned {
                self.pin(key.clone());
            }
            self.put(key, value);
        }
    }

    /// Empties every tier and drops every pin registration.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
        debug!(
            pinned = self.pinned.registrations(),
            primary = self.primary.len(),
            soft = self.soft.stored_len(),
            "clearing all tiers"
        );
        self.pinned.clear();
        self.primary.clear();
        self.soft.clear();
    }

    /// Changes the primary capacity, cascading any surplus into the soft tier.
    pub fn set_cache_size(&mut self, cache_size: usize) {
        let surplus = self.primary.set_capacity(cache_size);
        debug!(cache_size, surplus = surplus.len(), "resized primary tier");
        let now = Instant::now();
        for (key, value) in surplus {
            self.demote(key, value, now);
        }
    }

    /// Changes the soft capacity, dropping the oldest-demoted surplus.
    pub fn set_soft_reference_size(&mut self, soft_reference_size: usize) {
        let dropped = self.soft.set_capacity(soft_reference_size);
        debug!(soft_reference_size, dropped = dropped.len(), "resized soft tier");
        for (key, value) in dropped {
            self.notify_soft_overflow(&key, &value);
        }
    }

    /// Physically drops reclaimed or expired soft entries.
    ///
    /// Returns the number of entries purged.
    pub fn purge_soft(&mut self) -> usize {
        let purged = self.soft.purge(Instant::now());
        if purged.is_empty() {
            return 0;
        }
        debug!(count = purged.len(), "purged reclaimed soft entries");
        #[cfg(feature = "metrics")]
        self.metrics.record_soft_reclaimed(purged.len() as u64);
        if let Some(listener) = &self.listener {
            for (key, _) in &purged {
                listener.on_soft_reclaimed(key);
            }
        }
        purged.len()
    }

    fn insert_primary(&mut self, key: K, value: Arc<V>, now: Instant) -> Option<Arc<V>> {
        let Insertion { previous, overflow } = self.primary.insert(key, value);
        if let Some((victim, victim_value)) = overflow {
            self.demote(victim, victim_value, now);
        }
        previous
    }

    fn demote(&mut self, key: K, value: Arc<V>, now: Instant) {
        let demoted = self.soft.capacity() > 0;
        trace!(demoted, "primary tier overflow");
        #[cfg(feature = "metrics")]
        self.metrics.record_primary_overflow(demoted);
        if let Some(listener) = &self.listener {
            listener.on_primary_overflow(&key, &value, demoted);
        }
        if !demoted {
            return;
        }
        if let Some((dropped, dropped_value)) = self.soft.admit(key, value, now) {
            self.notify_soft_overflow(&dropped, &dropped_value);
        }
    }

    fn notify_soft_overflow(&self, key: &K, value: &Arc<V>) {
        trace!("soft tier overflow");
        #[cfg(feature = "metrics")]
        self.metrics.record_soft_overflow();
        if let Some(listener) = &self.listener {
            listener.on_soft_overflow(key, value);
        }
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verifies tier bounds, index/list agreement, and that no key holds a
    /// value in more than one tier.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.primary.check_invariants()?;
        self.soft.check_invariants()?;

        for key in self.pinned.keys() {
            if self.primary.contains_key(key) {
                return Err(InvariantError::new("pinned key also present in primary tier"));
            }
        }
        for key in self.soft.stored_keys() {
            if self.primary.contains_key(key) || self.pinned.value(key).is_some() {
                return Err(InvariantError::new(
                    "soft key also holds a value in another tier",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl<K, V> TieredCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn metrics(&self) -> &Arc<CacheMapMetrics> {
        &self.metrics
    }
}

impl<K, V> fmt::Debug for TieredCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCore")
            .field("order", &self.primary.order())
            .field("pinned", &self.pinned.registrations())
            .field("primary", &self.primary.len())
            .field("soft", &self.soft.stored_len())
            .field("cache_size", &self.primary.capacity())
            .field("soft_reference_size", &self.soft.capacity())
            .finish_non_exhaustive()
    }
}
