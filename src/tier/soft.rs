//! # Soft Tier
//!
//! Bounded secondary store for entries ejected from the primary tier.
//!
//! Entries are kept in demotion order. When the tier is full the entry that
//! was demoted earliest is dropped. Independently of capacity an entry may
//! stop being visible at any time:
//!
//! - the owning cache's [`ReclaimHandle`] was triggered after the entry was
//!   admitted, or
//! - the optional TTL elapsed since the entry was admitted.
//!
//! Each entry is stamped with the reclaim epoch current at admission, so a
//! reclaim only hides entries admitted before it. Invisible entries answer
//! every lookup as a miss. They are physically removed by
//! [`SoftTier::purge`], which the cache runs at the start of each write
//! operation. Admission order is also age and epoch order, so invisible
//! entries always sit at the front and purging stops at the first live one.
//!
//! ```text
//!   front (demoted earliest)                          back (demoted last)
//!   [A t=0 e=1] ◄──► [B t=3 e=1] ◄──► [C t=7 e=2] ◄──► [D t=9 e=2]
//!     │
//!     └── dropped first on overflow; first to expire or be reclaimed
//! ```

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ds::linked_index::LinkedIndex;
use crate::error::InvariantError;
use crate::reclaim::ReclaimHandle;

#[derive(Debug)]
struct SoftEntry<V> {
    value: Arc<V>,
    admitted_at: Instant,
    /// Reclaim epoch current when the entry was admitted.
    epoch: u64,
}

/// Entries removed by a purge.
pub(crate) type Purged<K, V> = Vec<(K, Arc<V>)>;

/// Bounded overflow store with external invalidation.
#[derive(Debug)]
pub(crate) struct SoftTier<K, V> {
    entries: LinkedIndex<K, SoftEntry<V>>,
    capacity: usize,
    ttl: Option<Duration>,
    reclaim: ReclaimHandle,
}

impl<K, V> SoftTier<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(
        capacity: usize,
        ttl: Option<Duration>,
        reclaim: ReclaimHandle,
        size_hint: usize,
    ) -> Self {
        Self {
            entries: LinkedIndex::with_capacity(capacity.min(size_hint)),
            capacity,
            ttl,
            reclaim,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries, including ones already invalidated but not
    /// yet purged.
    #[inline]
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries a reader would currently see.
    pub fn live_len(&self, now: Instant) -> usize {
        let epoch = self.reclaim.epoch();
        self.entries
            .iter()
            .filter(|(_, entry)| self.is_live(entry, epoch, now))
            .count()
    }

    #[inline]
    fn is_live(&self, entry: &SoftEntry<V>, epoch: u64, now: Instant) -> bool {
        entry.epoch == epoch
            && !self
                .ttl
                .is_some_and(|ttl| now.saturating_duration_since(entry.admitted_at) >= ttl)
    }

    fn visible<'a>(&self, entry: &'a SoftEntry<V>, now: Instant) -> Option<&'a Arc<V>> {
        self.is_live(entry, self.reclaim.epoch(), now)
            .then_some(&entry.value)
    }

    /// Returns the value for `key` if it is still visible.
    pub fn peek(&self, key: &K, now: Instant) -> Option<&Arc<V>> {
        self.entries.get(key).and_then(|e| self.visible(e, now))
    }

    #[inline]
    pub fn contains_key(&self, key: &K, now: Instant) -> bool {
        self.peek(key, now).is_some()
    }

    /// Removes `key`, returning its value only if it was still visible.
    pub fn take(&mut self, key: &K, now: Instant) -> Option<Arc<V>> {
        let entry = self.entries.remove(key)?;
        if self.is_live(&entry, self.reclaim.epoch(), now) {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Admits an entry ejected from the primary tier.
    ///
    /// Returns the entry dropped to make room: the oldest-demoted one when the
    /// tier is full, or the admitted entry itself when the tier is disabled.
    pub fn admit(&mut self, key: K, value: Arc<V>, now: Instant) -> Option<(K, Arc<V>)> {
        if self.capacity == 0 {
            return Some((key, value));
        }

        // Re-admission refreshes both stamps.
        self.entries.remove(&key);
        self.entries.push_back(
            key,
            SoftEntry {
                value,
                admitted_at: now,
                epoch: self.reclaim.epoch(),
            },
        );
        if self.entries.len() > self.capacity {
            self.entries.pop_front().map(|(k, e)| (k, e.value))
        } else {
            None
        }
    }

    /// Drops every reclaimed or expired entry, oldest first.
    pub fn purge(&mut self, now: Instant) -> Purged<K, V> {
        let mut purged = Vec::new();
        let epoch = self.reclaim.epoch();
        while let Some((_, entry)) = self.entries.front() {
            if self.is_live(entry, epoch, now) {
                break;
            }
            if let Some((key, entry)) = self.entries.pop_front() {
                purged.push((key, entry.value));
            }
        }
        purged
    }

    /// Changes the capacity, returning the dropped oldest-demoted entries.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<(K, Arc<V>)> {
        self.capacity = capacity;
        let surplus = self.entries.len().saturating_sub(capacity);
        (0..surplus)
            .filter_map(|_| self.entries.pop_front())
            .map(|(k, e)| (k, e.value))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates visible entries in demotion order.
    pub fn iter_live(&self, now: Instant) -> impl Iterator<Item = (&K, &Arc<V>)> {
        let epoch = self.reclaim.epoch();
        self.entries
            .iter()
            .filter(move |(_, e)| self.is_live(e, epoch, now))
            .map(|(k, e)| (k, &e.value))
    }

    /// Iterates every stored key, visible or not.
    pub fn stored_keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.entries.check_invariants()?;
        if self.entries.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "soft tier holds {} entries, capacity {}",
                self.entries.len(),
                self.capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(capacity: usize) -> (SoftTier<&'static str, i32>, ReclaimHandle) {
        let handle = ReclaimHandle::new();
        (SoftTier::new(capacity, None, handle.clone(), 16), handle)
    }

    #[test]
    fn full_tier_drops_oldest_demoted() {
        let (mut soft, _) = tier(2);
        let now = Instant::now();
        assert!(soft.admit("a", Arc::new(1), now).is_none());
        assert!(soft.admit("b", Arc::new(2), now).is_none());

        let dropped = soft.admit("c", Arc::new(3), now);
        assert_eq!(dropped.map(|(k, v)| (k, *v)), Some(("a", 1)));
        assert!(soft.peek(&"a", now).is_none());
        assert_eq!(soft.peek(&"c", now).map(|v| **v), Some(3));
        soft.check_invariants().unwrap();
    }

    #[test]
    fn disabled_tier_returns_admitted_entry() {
        let (mut soft, _) = tier(0);
        let dropped = soft.admit("a", Arc::new(1), Instant::now());
        assert_eq!(dropped.map(|(k, _)| k), Some("a"));
        assert_eq!(soft.stored_len(), 0);
    }

    #[test]
    fn reclaim_hides_entries_until_purged() {
        let (mut soft, handle) = tier(4);
        let now = Instant::now();
        soft.admit("a", Arc::new(1), now);
        soft.admit("b", Arc::new(2), now);

        handle.reclaim();
        assert!(soft.peek(&"a", now).is_none());
        assert_eq!(soft.live_len(now), 0);
        assert_eq!(soft.stored_len(), 2);

        let purged: Vec<_> = soft.purge(now).into_iter().map(|(k, _)| k).collect();
        assert_eq!(purged, vec!["a", "b"]);
        assert_eq!(soft.stored_len(), 0);

        // New admissions after the purge are visible again.
        soft.admit("c", Arc::new(3), now);
        assert!(soft.contains_key(&"c", now));
    }

    #[test]
    fn reclaim_only_hides_earlier_admissions() {
        let (mut soft, handle) = tier(4);
        let now = Instant::now();
        soft.admit("a", Arc::new(1), now);
        handle.reclaim();
        soft.admit("b", Arc::new(2), now);

        assert!(soft.peek(&"a", now).is_none());
        assert_eq!(soft.peek(&"b", now).map(|v| **v), Some(2));
        assert_eq!(soft.live_len(now), 1);

        let purged: Vec<_> = soft.purge(now).into_iter().map(|(k, _)| k).collect();
        assert_eq!(purged, vec!["a"]);
        assert!(soft.contains_key(&"b", now));
    }

    #[test]
    fn admission_after_unpurged_reclaim_is_visible() {
        let (mut soft, handle) = tier(4);
        let now = Instant::now();
        handle.reclaim();
        soft.admit("a", Arc::new(1), now);
        assert!(soft.contains_key(&"a", now));
        assert!(soft.purge(now).is_empty());
        assert_eq!(soft.take(&"a", now).map(|v| *v), Some(1));
    }

    #[test]
    fn readmission_after_reclaim_revives_entry() {
        let (mut soft, handle) = tier(4);
        let now = Instant::now();
        soft.admit("a", Arc::new(1), now);
        soft.admit("b", Arc::new(2), now);
        handle.reclaim();
        soft.admit("a", Arc::new(10), now);

        let live: Vec<_> = soft.iter_live(now).map(|(k, v)| (*k, **v)).collect();
        assert_eq!(live, vec![("a", 10)]);
        let purged: Vec<_> = soft.purge(now).into_iter().map(|(k, _)| k).collect();
        assert_eq!(purged, vec!["b"]);
    }

    #[test]
    fn take_of_reclaimed_entry_is_a_miss() {
        let (mut soft, handle) = tier(4);
        let now = Instant::now();
        soft.admit("a", Arc::new(1), now);
        handle.reclaim();
        assert!(soft.take(&"a", now).is_none());
        assert_eq!(soft.stored_len(), 0);
    }

    #[test]
    fn ttl_expires_from_the_front() {
        let handle = ReclaimHandle::new();
        let mut soft: SoftTier<&str, i32> =
            SoftTier::new(8, Some(Duration::from_secs(10)), handle, 8);
        let t0 = Instant::now();
        soft.admit("old", Arc::new(1), t0);
        soft.admit("new", Arc::new(2), t0 + Duration::from_secs(5));

        let later = t0 + Duration::from_secs(12);
        assert!(soft.peek(&"old", later).is_none());
        assert!(soft.peek(&"new", later).is_some());
        assert_eq!(soft.live_len(later), 1);

        let purged: Vec<_> = soft.purge(later).into_iter().map(|(k, _)| k).collect();
        assert_eq!(purged, vec!["old"]);
        assert_eq!(soft.stored_len(), 1);
    }

    #[test]
    fn readmission_moves_entry_to_back() {
        let (mut soft, _) = tier(2);
        let now = Instant::now();
        soft.admit("a", Arc::new(1), now);
        soft.admit("b", Arc::new(2), now);
        soft.admit("a", Arc::new(10), now);

        let dropped = soft.admit("c", Arc::new(3), now);
        assert_eq!(dropped.map(|(k, _)| k), Some("b"));
        assert_eq!(soft.peek(&"a", now).map(|v| **v), Some(10));
    }

    #[test]
    fn shrinking_drops_oldest_first() {
        let (mut soft, _) = tier(3);
        let now = Instant::now();
        for (i, k) in ["a", "b", "c"].into_iter().enumerate() {
            soft.admit(k, Arc::new(i as i32), now);
        }
        let dropped: Vec<_> = soft.set_capacity(1).into_iter().map(|(k, _)| k).collect();
        assert_eq!(dropped, vec!["a", "b"]);
        let live: Vec<_> = soft.iter_live(now).map(|(k, _)| *k).collect();
        assert_eq!(live, vec!["c"]);
    }
}
