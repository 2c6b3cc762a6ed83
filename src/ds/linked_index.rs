//! Keyed, insertion-ordered storage backed by a slot arena.
//!
//! Combines a hash index with a doubly linked list whose nodes live in a
//! `Vec`-backed arena and are linked by [`SlotId`]. Both the primary tier
//! (LRU or FIFO order) and the soft tier (demotion order) are built on it.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        slots: Vec<Option<Node<K, T>>>
//!   ┌─────────┬─────────┐              ┌────────┬──────────────────────────────┐
//!   │  key A  │  id_0   │ ───────────► │ id_0   │ { A, a, prev: None, next: 2 }│
//!   │  key B  │  id_2   │ ───────────► │ id_1   │ (free)                       │
//!   │  key C  │  id_3   │ ───────────► │ id_2   │ { B, b, prev: 0, next: 3 }   │
//!   └─────────┴─────────┘              │ id_3   │ { C, c, prev: 2, next: None }│
//!                                      └────────┴──────────────────────────────┘
//!
//!   head (oldest) ─► [A] ◄──► [B] ◄──► [C] ◄── tail (newest)
//! ```
//!
//! ## Operations
//! - `push_back(k, v)`: append as newest, or replace the value in place
//! - `move_to_back(k)`: detach + attach at tail
//! - `pop_front()`: remove the oldest node
//! - `remove(k)`: unlink + free the slot for reuse
//!
//! All of the above are O(1) average. `iter` walks oldest to newest.
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Stable handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

#[derive(Debug)]
struct Node<K, T> {
    key: K,
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Hash index over an arena-backed linked list, ordered oldest to newest.
#[derive(Debug)]
pub struct LinkedIndex<K, T> {
    slots: Vec<Option<Node<K, T>>>,
    free: Vec<usize>,
    index: FxHashMap<K, SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<K, T> LinkedIndex<K, T>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty index with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the value stored for `key` without reordering.
    pub fn get(&self, key: &K) -> Option<&T> {
        let id = *self.index.get(key)?;
        self.node(id).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        let id = *self.index.get(key)?;
        self.node_mut(id).map(|node| &mut node.value)
    }

    /// Returns the oldest entry.
    pub fn front(&self) -> Option<(&K, &T)> {
        self.head
            .and_then(|id| self.node(id))
            .map(|node| (&node.key, &node.value))
    }

    /// Appends `key` as the newest entry.
    ///
    /// If the key is already present its value is replaced in place (position
    /// unchanged) and the previous value is returned.
    pub fn push_back(&mut self, key: K, value: T) -> Option<T> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                SlotId(idx)
            },
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            },
        };
        self.index.insert(key, id);
        self.attach_back(id);
        None
    }

    /// Moves `key` to the newest position. Returns `false` if absent.
    pub fn move_to_back(&mut self, key: &K) -> bool {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        if self.tail != Some(id) {
            self.detach(id);
            self.attach_back(id);
        }
        true
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        let id = self.index.remove(key)?;
        self.detach(id);
        self.release(id).map(|node| node.value)
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<(K, T)> {
        let id = self.head?;
        self.detach(id);
        let node = self.release(id)?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Removes every entry, keeping allocated storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> Iter<'_, K, T> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len(),
        }
    }

    fn node(&self, id: SlotId) -> Option<&Node<K, T>> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<K, T>> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    fn release(&mut self, id: SlotId) -> Option<Node<K, T>> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(node)
    }

    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            },
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_back(&mut self, id: SlotId) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(id) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(node) = self.node_mut(t) {
                    node.next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Verifies that the index, the arena and the link chain agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self
                .node(id)
                .ok_or_else(|| InvariantError::new(format!("dangling slot {}", id.0)))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "broken back-link at slot {}",
                    id.0
                )));
            }
            if self.index.get(&node.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "slot {} not reachable from index",
                    id.0
                )));
            }
            count += 1;
            if count > self.index.len() {
                return Err(InvariantError::new("cycle detected in link chain"));
            }
            prev = Some(id);
            current = node.next;
        }
        if prev != self.tail {
            return Err(InvariantError::new("tail does not terminate the chain"));
        }
        if count != self.index.len() {
            return Err(InvariantError::new(format!(
                "chain length {} != index length {}",
                count,
                self.index.len()
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("LinkedIndex invariant violated: {}", err);
        }
    }
}

impl<K, T> Default for LinkedIndex<K, T>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Oldest-to-newest iterator over a [`LinkedIndex`].
pub struct Iter<'a, K, T> {
    list: &'a LinkedIndex<K, T>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, T> Iterator for Iter<'a, K, T>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.node(id)?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
