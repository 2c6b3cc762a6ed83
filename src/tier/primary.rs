//! # Primary Tier
//!
//! Bounded store for ordinary cached entries. Ejection order is chosen once at
//! construction:
//!
//! ```text
//!   EvictionOrder::Lru                    EvictionOrder::Fifo
//!   ═══════════════════════════           ═══════════════════════════
//!   get(B) moves B to the back            get(B) leaves order alone
//!
//!   front ─► [A] [C] [B] ◄─ back          front ─► [A] [B] [C] ◄─ back
//!            LRU       MRU                         oldest    newest
//!
//!   overflow ejects the front entry in both modes
//! ```
//!
//! FIFO lookups never reorder, so the concurrent wrapper can serve them under
//! the shared lock. LRU lookups must take the exclusive lock to refresh
//! recency.
//!
//! Capacity 0 is legal: every insert is ejected immediately and handed back to
//! the caller as the overflow victim.

use std::hash::Hash;
use std::sync::Arc;

use crate::ds::linked_index::LinkedIndex;
use crate::error::InvariantError;

/// Ejection order for the primary tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionOrder {
    /// Least recently used entry is ejected first.
    Lru,
    /// Oldest inserted entry is ejected first; lookups do not reorder.
    #[default]
    Fifo,
}

impl EvictionOrder {
    /// Maps the classic `lru` flag onto an ordering.
    pub fn from_lru_flag(lru: bool) -> Self {
        if lru {
            EvictionOrder::Lru
        } else {
            EvictionOrder::Fifo
        }
    }

    #[inline]
    pub fn is_lru(self) -> bool {
        matches!(self, EvictionOrder::Lru)
    }
}

/// Result of inserting into the primary tier.
#[derive(Debug)]
pub(crate) struct Insertion<K, V> {
    /// Value previously stored for the key in this tier.
    pub previous: Option<Arc<V>>,
    /// Entry ejected to stay within capacity.
    pub overflow: Option<(K, Arc<V>)>,
}

/// Bounded, ordered primary store.
#[derive(Debug)]
pub(crate) struct PrimaryTier<K, V> {
    entries: LinkedIndex<K, Arc<V>>,
    capacity: usize,
    order: EvictionOrder,
}

impl<K, V> PrimaryTier<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, order: EvictionOrder, size_hint: usize) -> Self {
        Self {
            entries: LinkedIndex::with_capacity(capacity.min(size_hint)),
            capacity,
            order,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn order(&self) -> EvictionOrder {
        self.order
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Looks up `key` without touching recency.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&Arc<V>> {
        self.entries.get(key)
    }

    /// Looks up `key`, refreshing its recency under LRU ordering.
    pub fn get(&mut self, key: &K) -> Option<&Arc<V>> {
        if self.order.is_lru() {
            self.entries.move_to_back(key);
        }
        self.entries.get(key)
    }

    /// Inserts or replaces `key`.
    ///
    /// A replaced entry counts as a use under LRU ordering and keeps its
    /// position under FIFO ordering. At most one entry overflows per call.
    pub fn insert(&mut self, key: K, value: Arc<V>) -> Insertion<K, V> {
        if let Some(slot) = self.entries.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            if self.order.is_lru() {
                self.entries.move_to_back(&key);
            }
            return Insertion {
                previous: Some(previous),
                overflow: None,
            };
        }

        if self.capacity == 0 {
            return Insertion {
                previous: None,
                overflow: Some((key, value)),
            };
        }

        self.entries.push_back(key, value);
        let overflow = if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        Insertion {
            previous: None,
            overflow,
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key)
    }

    /// Changes the capacity, returning the surplus entries in ejection order.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<(K, Arc<V>)> {
        self.capacity = capacity;
        let surplus = self.entries.len().saturating_sub(capacity);
        (0..surplus)
            .filter_map(|_| self.entries.pop_front())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates entries in ejection order (next victim first).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.entries.iter()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.entries.check_invariants()?;
        if self.entries.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "primary tier holds {} entries, capacity {}",
                self.entries.len(),
                self.capacity
            )));
        }
        Ok(())
    }
}
