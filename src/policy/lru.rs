//! # Least Recently Used (LRU) core
//!
//! Single-threaded LRU engine shared by [`LruCache`](crate::LruCache) and
//! [`ShardedLruCache`](crate::ShardedLruCache). Those façades add locking and
//! eviction notification; this module only keeps the index and the recency
//! order consistent.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          LruCore<V>                              │
//!   │                                                                  │
//!   │   ┌──────────────────────────────────────────────────────────┐   │
//!   │   │  FxHashMap<Arc<str>, SlotId>   (index)                   │   │
//!   │   │                                                          │   │
//!   │   │   "a" ──┐     "b" ──┐     "c" ──┐                        │   │
//!   │   └─────────┼───────────┼───────────┼────────────────────────┘   │
//!   │             ▼           ▼           ▼                            │
//!   │   ┌──────────────────────────────────────────────────────────┐   │
//!   │   │  RecencyList<Entry<V>>         (order + storage)         │   │
//!   │   │                                                          │   │
//!   │   │  head ──► [a] ◄──► [b] ◄──► [c] ◄── tail                 │   │
//!   │   │           LRU                MRU                         │   │
//!   │   └──────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each entry stores its key as `Arc<str>`; the index holds a second handle
//! to the same allocation, so evicting an entry hands the key out without
//! copying it.
//!
//! ## Operations
//!
//! | Method          | Complexity | Description                                 |
//! |-----------------|------------|---------------------------------------------|
//! | `lookup(key)`   | O(1)       | Slot of `key`, order unchanged              |
//! | `touch(id)`     | O(1)       | Move slot to MRU                            |
//! | `insert(k, v)`  | O(1)       | New entry at MRU; caller enforces capacity  |
//! | `evict_head()`  | O(1)       | Remove and return the LRU entry             |
//! | `get(key)`      | O(1)       | `lookup` + `touch`                          |
//! | `put(key, v)`   | O(1)       | Update in place, or evict if full + insert  |
//! | `peek(key)`     | O(1)       | Value without reordering                    |
//! | `keys()`        | O(n)       | Keys from LRU to MRU                        |
//!
//! ## PUT flow (cache full, new key)
//!
//! ```text
//!   Before:   head ──► [a] ◄──► [b] ◄── tail        (capacity = 2)
//!
//!   put("c"):
//!     1. lookup("c")       → miss
//!     2. len == capacity   → evict_head() removes [a]
//!     3. insert("c")       → [c] appended at tail
//!
//!   After:    head ──► [b] ◄──► [c] ◄── tail        evicted: "a"
//! ```
//!
//! ## Thread Safety
//!
//! `LruCore` is not synchronized. Every method that changes recency takes
//! `&mut self`, so the borrow checker forces callers that share it to wrap it
//! in a lock.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ds::recency_list::RecencyList;
use crate::ds::slot_arena::SlotId;
use crate::error::{CacheError, InvariantError};

#[derive(Debug)]
struct Entry<V> {
    key: Arc<str>,
    value: Arc<V>,
}

/// An entry removed from the cache because of capacity pressure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted<V> {
    pub key: Arc<str>,
    pub value: Arc<V>,
}

/// Index + recency order for a single LRU partition.
pub struct LruCore<V> {
    index: FxHashMap<Arc<str>, SlotId>,
    order: RecencyList<Entry<V>>,
    capacity: usize,
}

impl<V> LruCore<V> {
    /// Creates an empty core holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity { capacity });
        }
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: RecencyList::with_capacity(capacity),
            capacity,
        })
    }

    /// Returns the slot for `key` without changing its recency.
    #[inline]
    pub fn lookup(&self, key: &str) -> Option<SlotId> {
        self.index.get(key).copied()
    }

    /// Marks `id` as most recently used. A node already at the tail is left
    /// where it is. Returns `false` if `id` does not name a live entry.
    #[inline]
    pub fn touch(&mut self, id: SlotId) -> bool {
        self.order.move_to_back(id)
    }

    /// Value stored at `id`.
    #[inline]
    pub fn value(&self, id: SlotId) -> Option<&Arc<V>> {
        self.order.get(id).map(|entry| &entry.value)
    }

    /// Appends a new entry at the most recently used end.
    ///
    /// The caller must have made room first; debug builds assert that `key`
    /// is new and the core is below capacity.
    pub fn insert(&mut self, key: Arc<str>, value: Arc<V>) -> SlotId {
        debug_assert!(self.index.len() < self.capacity, "insert into full LruCore");
        debug_assert!(!self.index.contains_key(&*key), "duplicate key {key:?}");

        let id = self.order.push_back(Entry {
            key: Arc::clone(&key),
            value,
        });
        self.index.insert(key, id);

        id
    }

    /// Removes the least recently used entry from both the list and the index.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] if the core is empty or the head entry is
    /// missing from the index.
    pub fn evict_head(&mut self) -> Result<Evicted<V>, InvariantError> {
        let (id, entry) = self
            .order
            .pop_front()
            .ok_or_else(|| InvariantError::new("evict_head on an empty LruCore"))?;

        match self.index.remove(&*entry.key) {
            Some(indexed) if indexed == id => {},
            other => {
                return Err(InvariantError::new(format!(
                    "head entry {:?} indexed at {:?}, expected slot {}",
                    entry.key,
                    other,
                    id.index()
                )));
            },
        }


        Ok(Evicted {
            key: entry.key,
            value: entry.value,
        })
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&Arc<V>> {
        let id = self.lookup(key)?;
        self.touch(id);
        self.value(id)
    }

    /// Inserts or updates `key`.
    ///
    /// An existing key has its value replaced and moves to the most recently
    /// used end; nothing is evicted. A new key arriving at a full core first
    /// evicts the least recently used entry, which is returned.
    pub fn put(&mut self, key: &str, value: Arc<V>) -> Result<Option<Evicted<V>>, InvariantError> {
        if let Some(id) = self.lookup(key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            self.touch(id);
            return Ok(None);
        }

        let evicted = if self.index.len() >= self.capacity {
            Some(self.evict_head()?)
        } else {
            None
        };
        self.insert(Arc::from(key), value);
        Ok(evicted)
    }

    /// Returns the value for `key` without changing recency.
    #[inline]
    pub fn peek(&self, key: &str) -> Option<&Arc<V>> {
        self.lookup(key).and_then(|id| self.value(id))
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&str, &Arc<V>)> {
        self.order
            .front()
            .map(|entry| (&*entry.key, &entry.value))
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(|entry| &*entry.key)
    }

    /// Verifies capacity, index/list agreement and list linkage.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.capacity == 0 {
            return Err(InvariantError::new("capacity is zero"));
        }
        if self.index.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.index.len(),
                self.capacity
            )));
        }
        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "index has {} keys, recency list has {}",
                self.index.len(),
                self.order.len()
            )));
        }
        self.order.validate().map_err(InvariantError::new)?;

        for (id, entry) in self.order.iter_entries() {
            if self.index.get(&*entry.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "key {:?} at slot {} is not indexed there",
                    entry.key,
                    id.index()
                )));
            }
        }
        Ok(())
    }
}

impl<V> fmt::Debug for LruCore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
