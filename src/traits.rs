//! # Cache trait
//!
//! [`ConcurrentCache`] is the surface shared by [`LruCache`](crate::LruCache)
//! and [`ShardedLruCache`](crate::ShardedLruCache), so code that only needs
//! string-keyed get/put with eviction notices can accept either.
//!
//! ```text
//!                 ┌───────────────────────────────────────────┐
//!                 │          ConcurrentCache<V>               │
//!                 │                                           │
//!                 │  get(&, key) → Option<Arc<V>>   (touch)   │
//!                 │  put(&, key, V) → Result<()>              │
//!                 │  put_arc(&, key, Arc<V>) → Result<()>     │
//!                 │  peek(&, key) → Option<Arc<V>>            │
//!                 │  contains / len / is_empty / capacity     │
//!                 │  subscribe(observer) → SubscriptionId     │
//!                 │  unsubscribe(SubscriptionId) → bool       │
//!                 └─────────────────────┬─────────────────────┘
//!                                       │
//!                  ┌────────────────────┴───────────────────┐
//!                  ▼                                        ▼
//!        LruCache<V>                              ShardedLruCache<V>
//!        one lock, global LRU order               lock per shard, LRU per shard
//! ```
//!
//! Every method takes `&self`; implementations synchronize internally.
//!
//! ## Example
//!
//! ```
//! use evictkit::traits::ConcurrentCache;
//! use evictkit::{CacheBuilder, LruCache};
//!
//! fn warm<C: ConcurrentCache<String>>(cache: &C) {
//!     for name in ["alpha", "beta"] {
//!         cache.put(name, name.to_uppercase()).unwrap();
//!     }
//! }
//!
//! let single: LruCache<String> = LruCache::new(8).unwrap();
//! let sharded = CacheBuilder::new(8).shards(2).build_sharded::<String>().unwrap();
//! warm(&single);
//! warm(&sharded);
//! assert_eq!(single.len(), 2);
//! assert_eq!(ConcurrentCache::len(&sharded), 2);
//! ```

use std::sync::Arc;

use crate::error::CacheError;
use crate::notify::{EvictionObserver, SubscriptionId};

/// Thread-safe string-keyed cache that reports capacity evictions.
pub trait ConcurrentCache<V>: Send + Sync {
    /// Returns the value for `key` and marks it most recently used. `None`
    /// keys and absent keys are misses.
    fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>>;

    /// Inserts or replaces an already shared value.
    ///
    /// # Errors
    ///
    /// [`CacheError::NullKey`] for a `None` key.
    fn put_arc<'k>(&self, key: impl Into<Option<&'k str>>, value: Arc<V>) -> Result<(), CacheError>;

    /// Value for `key` without touching recency.
    fn peek<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>>;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn subscribe_observer(&self, observer: Arc<dyn EvictionObserver>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn put<'k>(&self, key: impl Into<Option<&'k str>>, value: V) -> Result<(), CacheError> {
        self.put_arc(key, Arc::new(value))
    }

    fn contains<'k>(&self, key: impl Into<Option<&'k str>>) -> bool {
        self.peek(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn subscribe<O: EvictionObserver>(&self, observer: O) -> SubscriptionId
    where
        Self: Sized,
    {
        self.subscribe_observer(Arc::new(observer))
    }
}
