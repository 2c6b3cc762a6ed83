//! Unbounded store for entries exempt from eviction.
//!
//! A pin registration may exist before any value does ("pinned-empty"); a
//! later `put` then lands directly here.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

#[derive(Debug)]
pub(crate) struct PinnedTier<K, V> {
    entries: FxHashMap<K, Option<Arc<V>>>,
}

impl<K, V> PinnedTier<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(size_hint: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(size_hint, Default::default()),
        }
    }

    /// Returns `true` if `key` holds a pin registration, with or without a value.
    #[inline]
    pub fn is_pinned(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Pin lookup: `None` if not pinned, `Some(None)` if pinned-empty.
    #[inline]
    pub fn slot(&self, key: &K) -> Option<Option<&Arc<V>>> {
        self.entries.get(key).map(Option::as_ref)
    }

    #[inline]
    pub fn value(&self, key: &K) -> Option<&Arc<V>> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// Stores `value` for an already pinned key, returning the previous value.
    /// Returns `Err(value)` if the key is not pinned.
    pub fn replace(&mut self, key: &K, value: Arc<V>) -> Result<Option<Arc<V>>, Arc<V>> {
        match self.entries.get_mut(key) {
            Some(slot) => Ok(slot.replace(value)),
            None => Err(value),
        }
    }

    /// Registers a pin, adopting `value` if one was found in another tier.
    pub fn pin(&mut self, key: K, value: Option<Arc<V>>) {
        self.entries.insert(key, value);
    }

    /// Drops the pin registration, returning the slot if one existed.
    pub fn unpin(&mut self, key: &K) -> Option<Option<Arc<V>>> {
        self.entries.remove(key)
    }

    /// Number of pin registrations, including empty ones.
    #[inline]
    pub fn registrations(&self) -> usize {
        self.entries.len()
    }

    /// Number of pinned keys that hold a value.
    pub fn valued_len(&self) -> usize {
        self.entries.values().filter(|v| v.is_some()).count()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Iterates pinned keys that hold a value.
    pub fn iter_valued(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pin_then_replace_fills_slot() {
        let mut pinned: PinnedTier<&str, i32> = PinnedTier::new(4);
        pinned.pin("k", None);
        assert!(pinned.is_pinned(&"k"));
        assert_eq!(pinned.slot(&"k"), Some(None));
        assert_eq!(pinned.valued_len(), 0);

        assert_eq!(pinned.replace(&"k", Arc::new(1)), Ok(None));
        assert_eq!(pinned.value(&"k").map(|v| **v), Some(1));
        assert_eq!(pinned.replace(&"k", Arc::new(2)).map(|p| p.map(|v| *v)), Ok(Some(1)));
        assert_eq!(pinned.valued_len(), 1);
    }

    #[test]
    fn replace_on_unpinned_key_hands_value_back() {
        let mut pinned: PinnedTier<&str, i32> = PinnedTier::new(4);
        let back = pinned.replace(&"k", Arc::new(7)).unwrap_err();
        assert_eq!(*back, 7);
        assert!(!pinned.is_pinned(&"k"));
    }

    #[test]
    fn unpin_returns_slot() {
        let mut pinned: PinnedTier<&str, i32> = PinnedTier::new(4);
        pinned.pin("a", Some(Arc::new(1)));
        pinned.pin("b", None);

        assert_eq!(pinned.unpin(&"a").map(|s| s.map(|v| *v)), Some(Some(1)));
        assert_eq!(pinned.unpin(&"b"), Some(None));
        assert_eq!(pinned.unpin(&"b"), None);
        assert_eq!(pinned.registrations(), 0);
    }
}
