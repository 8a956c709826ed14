//! Slot-addressed storage with free-list reuse.
//!
//! Values live in a flat `Vec` and are addressed by [`SlotId`], a plain index
//! that stays valid until the value is removed. Freed indices are pushed onto
//! a free list and handed out again by the next `insert`, so a long-running
//! cache with a fixed capacity never grows its backing storage past that
//! capacity.
//!
//! ```text
//!   slots:      [ Some(a) | None | Some(c) | Some(d) ]
//!   free_list:  [ 1 ]
//!
//!   insert(e) -> SlotId(1)
//!   slots:      [ Some(a) | Some(e) | Some(c) | Some(d) ]
//! ```
//!
//! A removed `SlotId` may be reused for a different value. Holders of ids must
//! drop them when the value is removed; the recency list and the LRU index do
//! this under the same lock that performs the removal.

/// Stable handle to a value stored in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Vector-backed arena with O(1) insert, remove and lookup by [`SlotId`].
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an arena with room for `capacity` values before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value`, reusing a freed slot when one is available.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_list.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx].is_none(), "free slot {idx} is occupied");
                self.slots[idx] = Some(value);
                idx
            },
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Removes the value at `id`. Returns `None` for vacant or out-of-range ids.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn contains(&self, id: SlotId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_reuses_freed_slot() {
        let mut arena = SlotArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(a));

        let c = arena.insert("c");
        assert_eq!(c.index(), a.index());
        assert_eq!(arena.get(c), Some(&"c"));
        assert_eq!(arena.slots.len(), 2);
    }

    #[test]
    fn remove_vacant_or_unknown_is_none() {
        let mut arena = SlotArena::new();
        let id = arena.insert(1u32);
        assert_eq!(arena.remove(id), Some(1));
        assert_eq!(arena.remove(id), None);
        assert_eq!(arena.remove(SlotId(99)), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut arena = SlotArena::with_capacity(4);
        let id = arena.insert(10);
        if let Some(v) = arena.get_mut(id) {
            *v += 5;
        }
        assert_eq!(arena.get(id), Some(&15));
    }

    #[test]
    fn fixed_working_set_does_not_grow() {
        let mut arena = SlotArena::with_capacity(3);
        let mut ids: Vec<_> = (0..3).map(|i| arena.insert(i)).collect();
        for round in 0..100 {
            let victim = ids.remove(0);
            arena.remove(victim);
            ids.push(arena.insert(round));
        }
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.slots.len(), 3);
    }

    #[test]
    fn vacant_slots_are_not_contained() {
        let mut arena = SlotArena::new();
        let a = arena.insert('a');
        let b = arena.insert('b');
        arena.remove(b);
        assert!(arena.contains(a));
        assert!(!arena.contains(b));
        assert!(!arena.contains(SlotId(7)));
    }
}
