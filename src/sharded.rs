//! # Sharded LRU cache
//!
//! [`ShardedLruCache`] splits the key space across independently locked
//! [`LruCore`] partitions so that writers touching different keys do not
//! contend on one lock. All shards share a single eviction notifier.
//!
//! ```text
//!   key ──► ShardSelector ──► shard i
//!
//!   ┌───────────────┐ ┌───────────────┐     ┌───────────────┐
//!   │ RwLock<Core>  │ │ RwLock<Core>  │ ... │ RwLock<Core>  │
//!   │ cap = c0      │ │ cap = c1      │     │ cap = cN      │
//!   └──────┬────────┘ └──────┬────────┘     └──────┬────────┘
//!          └─────────────────┴──────────┬──────────┘
//!                                       ▼
//!                             EvictionNotifier (shared)
//! ```
//!
//! Recency is tracked per shard: a full shard evicts its own least recently
//! used entry even if another shard holds an older one. The total entry count
//! never exceeds the configured capacity because shard capacities sum to it.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::builder::CacheConfig;
use crate::ds::{distribute_capacity, ShardSelector};
use crate::error::{CacheError, InvariantError};
use crate::notify::{
    EvictionNotifier, EvictionObserver, FnObserver, NotifierStats, ObserverError, SubscriptionId,
};
use crate::policy::lru::LruCore;
use crate::traits::ConcurrentCache;

/// String-keyed LRU cache partitioned into independently locked shards.
pub struct ShardedLruCache<V> {
    shards: Box<[RwLock<LruCore<V>>]>,
    selector: ShardSelector,
    capacity: usize,
    notifier: EvictionNotifier,
}

impl<V> ShardedLruCache<V>
where
    V: Send + Sync + 'static,
{
    /// Builds a sharded cache from a config. Prefer
    /// [`CacheBuilder::build_sharded`](crate::builder::CacheBuilder::build_sharded).
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate_sharded()?;

        let shards = distribute_capacity(config.capacity, config.shards)
            .into_iter()
            .map(|cap| LruCore::new(cap).map(RwLock::new))
            .collect::<Result<Vec<_>, _>>()?
            .into_boxed_slice();
        let notifier = EvictionNotifier::start(&config.notifier)?;

        debug!(
            "sharded cache created: capacity {} over {} shards",
            config.capacity, config.shards
        );

        Ok(Self {
            shards,
            selector: ShardSelector::new(config.shards, config.shard_seed),
            capacity: config.capacity,
            notifier,
        })
    }

    #[inline]
    fn shard(&self, key: &str) -> &RwLock<LruCore<V>> {
        &self.shards[self.selector.shard_for_key(key)]
    }

    /// Returns the value for `key` and marks it most recently used within its
    /// shard.
    pub fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        let key = key.into()?;
        let core = self.shard(key).upgradable_read();
        let Some(id) = core.lookup(key) else {
            trace!("cache miss for {:?}", key);
            return None;
        };
        let mut core = RwLockUpgradableReadGuard::upgrade(core);
        core.touch(id);
        core.value(id).cloned()
    }

    pub fn put<'k>(&self, key: impl Into<Option<&'k str>>, value: V) -> Result<(), CacheError> {
        let key = key.into().ok_or(CacheError::NullKey)?;
        self.store(key, Arc::new(value))
    }

    pub fn put_arc<'k>(&self, key: impl Into<Option<&'k str>>, value: Arc<V>) -> Result<(), CacheError> {
        let key = key.into().ok_or(CacheError::NullKey)?;
        self.store(key, value)
    }

    fn store(&self, key: &str, value: Arc<V>) -> Result<(), CacheError> {
        let evicted = self.shard(key).write().put(key, value)?;
        if let Some(evicted) = evicted {
            debug!("evicted {:?} to make room for {:?}", evicted.key, key);
            self.notifier.notify(evicted.key);
        }
        Ok(())
    }

    pub fn peek<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        let key = key.into()?;
        self.shard(key).read().peek(key).cloned()
    }

    pub fn contains<'k>(&self, key: impl Into<Option<&'k str>>) -> bool {
        key.into()
            .is_some_and(|key| self.shard(key).read().contains(key))
    }

    /// Sum of shard sizes. Shards are read one after another, so concurrent
    /// writers may make the total momentarily stale.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Per-shard `(len, capacity)` pairs.
    pub fn shard_sizes(&self) -> Vec<(usize, usize)> {
        self.shards
            .iter()
            .map(|shard| {
                let core = shard.read();
                (core.len(), core.capacity())
            })
            .collect()
    }

    pub fn subscribe<O: EvictionObserver>(&self, observer: O) -> SubscriptionId {
        self.notifier.subscribe(Arc::new(observer))
    }

    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&str) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        self.subscribe(FnObserver::new(f))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    pub fn notifier_stats(&self) -> NotifierStats {
        self.notifier.stats()
    }

    /// Checks every shard, then that each key lives in the shard it hashes to.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        for (i, shard) in self.shards.iter().enumerate() {
            let core = shard.read();
            core.check_invariants()?;
            let misplaced = core
                .keys()
                .find(|key| self.selector.shard_for_key(*key) != i)
                .map(str::to_string);
            if let Some(key) = misplaced {
                return Err(InvariantError::new(format!("key {key:?} stored in shard {i}")).into());
            }
        }
        Ok(())
    }

    /// Releases the cache after delivering already queued eviction notices.
    pub fn dispose(mut self) {
        debug!("disposing sharded cache with {} entries", self.len());
        self.notifier.shutdown();
    }
}

impl<V> fmt::Debug for ShardedLruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLruCache")
            .field("shards", &self.shards.len())
            .field("capacity", &self.capacity)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl<V> ConcurrentCache<V> for ShardedLruCache<V>
where
    V: Send + Sync + 'static,
{
    fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        ShardedLruCache::get(self, key)
    }

    fn put_arc<'k>(&self, key: impl Into<Option<&'k str>>, value: Arc<V>) -> Result<(), CacheError> {
        ShardedLruCache::put_arc(self, key, value)
    }

    fn peek<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        ShardedLruCache::peek(self, key)
    }

    fn len(&self) -> usize {
        ShardedLruCache::len(self)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn subscribe_observer(&self, observer: Arc<dyn EvictionObserver>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        ShardedLruCache::unsubscribe(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CacheBuilder;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn sharded<V: Send + Sync + 'static>(capacity: usize, shards: usize) -> ShardedLruCache<V> {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
        CacheBuilder::new(capacity)
            .shards(shards)
            .build_sharded()
            .unwrap()
    }

    #[test]
    fn capacity_is_split_across_shards() {
        let cache = sharded::<u8>(10, 4);
        let caps: Vec<_> = cache.shard_sizes().into_iter().map(|(_, cap)| cap).collect();
        assert_eq!(caps, vec![3, 3, 2, 2]);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn total_len_never_exceeds_capacity() {
        let cache = sharded::<usize>(16, 4);
        for i in 0..200 {
            cache.put(format!("key-{i}").as_str(), i).unwrap();
            assert!(cache.len() <= 16);
        }
        cache.check_invariants().unwrap();
    }

    #[test]
    fn check_invariants_walks_every_shard() {
        let cache = sharded::<usize>(12, 3);
        assert!(cache.check_invariants().is_ok());
        for i in 0..40 {
            cache.put(format!("user:{i}").as_str(), i).unwrap();
            let _ = cache.get(format!("user:{}", i / 2).as_str());
            cache.check_invariants().unwrap();
        }
        assert_eq!(cache.len(), 12);
    }

    #[test]
    fn single_shard_matches_global_lru() {
        let cache = sharded::<i32>(2, 1);
        cache.put("a", 1).unwrap();
        cache.put("b", 2).unwrap();
        cache.get("a");
        cache.put("c", 3).unwrap();
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn null_keys() {
        let cache = sharded::<i32>(4, 2);
        assert!(matches!(cache.put(None::<&str>, 1), Err(CacheError::NullKey)));
        assert!(cache.get(None::<&str>).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evictions_are_reported_once() {
        let cache = sharded::<usize>(4, 2);
        let (tx, rx) = unbounded();
        cache.subscribe_fn(move |key| {
            tx.send(key.to_string())?;
            Ok(())
        });

        for i in 0..20 {
            cache.put(format!("k{i}").as_str(), i).unwrap();
        }
        let live = cache.len();
        cache.dispose();

        let mut seen: Vec<String> = rx.try_iter().collect();
        assert_eq!(seen.len(), 20 - live);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 20 - live);
    }

    #[test]
    fn peek_and_update() {
        let cache = sharded::<i32>(4, 2);
        cache.put("x", 1).unwrap();
        cache.put("x", 2).unwrap();
        assert_eq!(cache.peek("x").as_deref(), Some(&2));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("y").is_none());
    }

    #[test]
    fn observer_survives_failure() {
        let cache = sharded::<i32>(2, 2);
        cache.subscribe_fn(|_| panic!("observer bug"));
        let (tx, rx) = unbounded();
        cache.subscribe_fn(move |key| {
            tx.send(key.to_string())?;
            Ok(())
        });

        for i in 0..6 {
            cache.put(format!("k{i}").as_str(), i).unwrap();
        }
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert_eq!(cache.observer_count(), 2);
    }
}
