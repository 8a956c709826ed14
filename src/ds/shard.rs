//! Key-to-shard mapping and capacity splitting for sharded caches.
//!
//! ```text
//!   "user:17" ──► hash(seed, key) % shards ──► shard 2
//!
//!   capacity 10 over 4 shards ──► [3, 3, 2, 2]
//! ```
//!
//! The mapping is deterministic for a given `(key, seed, shards)` triple, so
//! the same key always lands in the same shard for the lifetime of a cache.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic shard selector using a seeded hash.
///
/// # Example
///
/// ```
/// use evictkit::ds::ShardSelector;
///
/// let selector = ShardSelector::new(4, 0);
/// let shard = selector.shard_for_key("user:alice");
/// assert!(shard < 4);
/// assert_eq!(selector.shard_for_key("user:alice"), shard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector over `shards` shards. A shard count of zero is
    /// clamped to one.
    pub fn new(shards: usize, seed: u64) -> Self {
        Self {
            shards: shards.max(1),
            seed,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }

    /// Maps `key` to a shard index in `[0, shard_count)`.
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        if self.shards == 1 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.shards as u64) as usize
    }
}

impl Default for ShardSelector {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Splits `total` into `shards` near-equal parts; the first `total % shards`
/// parts get one extra unit.
pub fn distribute_capacity(total: usize, shards: usize) -> Vec<usize> {
    let shards = shards.max(1);
    let base = total / shards;
    let extra = total % shards;
    (0..shards)
        .map(|i| base + usize::from(i < extra))
        .collect()
}
