//! # Concurrent LRU cache with eviction notification
//!
//! [`LruCache`] wraps an [`LruCore`] in a single `parking_lot::RwLock` and
//! forwards capacity evictions to an asynchronous notifier.
//!
//! ## Concurrency Model
//!
//! ```text
//!   Thread 1            Thread 2            Thread 3
//!      │ get("a")          │ peek("b")         │ put("c")
//!      ▼                   ▼                   ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                        RwLock                            │
//!   │                                                          │
//!   │  get()   upgradable read → lookup                        │
//!   │            miss: release, never takes write              │
//!   │            hit:  upgrade to write → touch → clone Arc    │
//!   │  put()   write for the whole structural update           │
//!   │  peek()  read (no reordering)                            │
//!   └──────────────────────────────────────────────────────────┘
//!                                  │ evicted key, lock released
//!                                  ▼
//!                        EvictionNotifier queue
//! ```
//!
//! Only one upgradable reader may hold the lock at a time, so a `get` hit
//! behaves like a writer; misses and plain reads still proceed alongside
//! `peek`/`len`/`contains`. Every operation is linearizable in lock order.
//!
//! ## Null keys
//!
//! Keys are accepted as `impl Into<Option<&str>>`, so both `"a"` and
//! `None::<&str>` are valid arguments. `get(None)` is a miss; `put(None, _)`
//! fails with [`CacheError::NullKey`]. The empty string is an ordinary key.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::LruCache;
//!
//! let cache: LruCache<u32> = LruCache::new(2).unwrap();
//! let (tx, rx) = std::sync::mpsc::channel();
//! let tx = std::sync::Mutex::new(tx);
//! cache.subscribe_fn(move |key| {
//!     tx.lock().unwrap().send(key.to_string())?;
//!     Ok(())
//! });
//!
//! cache.put("a", 1).unwrap();
//! cache.put("b", 2).unwrap();
//! assert_eq!(cache.get("a").as_deref(), Some(&1));
//! cache.put("c", 3).unwrap(); // evicts "b"
//!
//! assert_eq!(rx.recv().unwrap(), "b");
//! assert!(cache.get("b").is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::builder::CacheBuilder;
use crate::error::CacheError;
use crate::notify::{
    EvictionNotifier, EvictionObserver, FnObserver, NotifierConfig, NotifierStats, ObserverError,
    SubscriptionId,
};
use crate::policy::lru::LruCore;
use crate::traits::ConcurrentCache;

/// Thread-safe, capacity-bounded LRU cache keyed by strings.
///
/// Values are stored as `Arc<V>`; `get` hands out a clone of the `Arc`, which
/// stays valid after the entry is evicted.
pub struct LruCache<V> {
    core: RwLock<LruCore<V>>,
    notifier: EvictionNotifier,
}

impl<V> LruCache<V>
where
    V: Send + Sync + 'static,
{
    /// Creates a cache holding at most `capacity` entries, with the default
    /// notifier settings.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] when `capacity` is zero, or
    /// [`CacheError::NotifierSpawn`] if the notifier thread cannot start.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        CacheBuilder::new(capacity).build()
    }

    pub(crate) fn with_notifier(capacity: usize, notifier: &NotifierConfig) -> Result<Self, CacheError> {
        let core = LruCore::new(capacity)?;
        let notifier = EvictionNotifier::start(notifier)?;
        Ok(Self {
            core: RwLock::new(core),
            notifier,
        })
    }

    /// Returns the value for `key` and marks it most recently used.
    ///
    /// A `None` key or an absent key is a miss.
    pub fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        let key = key.into()?;
        let core = self.core.upgradable_read();
        let Some(id) = core.lookup(key) else {
            trace!("cache miss for {:?}", key);
            return None;
        };
        let mut core = RwLockUpgradableReadGuard::upgrade(core);
        core.touch(id);
        core.value(id).cloned()
    }

    /// Inserts or replaces `key`, evicting the least recently used entry if a
    /// new key arrives at a full cache.
    ///
    /// # Errors
    ///
    /// [`CacheError::NullKey`] for a `None` key; the cache is left unchanged.
    pub fn put<'k>(&self, key: impl Into<Option<&'k str>>, value: V) -> Result<(), CacheError> {
        let key = key.into().ok_or(CacheError::NullKey)?;
        self.store(key, Arc::new(value))
    }

    /// Like [`put`](Self::put) for a value that is already shared.
    pub fn put_arc<'k>(&self, key: impl Into<Option<&'k str>>, value: Arc<V>) -> Result<(), CacheError> {
        let key = key.into().ok_or(CacheError::NullKey)?;
        self.store(key, value)
    }

    fn store(&self, key: &str, value: Arc<V>) -> Result<(), CacheError> {
        let evicted = self.core.write().put(key, value)?;
        if let Some(evicted) = evicted {
            debug!("evicted {:?} to make room for {:?}", evicted.key, key);
            self.notifier.notify(evicted.key);
        }
        Ok(())
    }

    /// Returns the value for `key` without changing recency.
    pub fn peek<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        let key = key.into()?;
        self.core.read().peek(key).cloned()
    }

    pub fn contains<'k>(&self, key: impl Into<Option<&'k str>>) -> bool {
        key.into().is_some_and(|key| self.core.read().contains(key))
    }

    pub fn len(&self) -> usize {
        self.core.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.core.read().capacity()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.core.read().keys().map(str::to_string).collect()
    }

    /// Registers `observer` for every subsequent eviction.
    pub fn subscribe<O: EvictionObserver>(&self, observer: O) -> SubscriptionId {
        self.notifier.subscribe(Arc::new(observer))
    }

    /// Registers a closure as an eviction observer.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&str) -> Result<(), ObserverError> + Send + Sync + 'static,
    {
        self.subscribe(FnObserver::new(f))
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    pub fn notifier_stats(&self) -> NotifierStats {
        self.notifier.stats()
    }

    /// Verifies the internal structure under a read lock.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        self.core.read().check_invariants()?;
        Ok(())
    }

    /// Releases the cache: stops accepting work, delivers the eviction notices
    /// that are already queued and joins the notifier thread.
    ///
    /// Dropping the cache does the same; `dispose` makes the point explicit.
    pub fn dispose(mut self) {
        debug!("disposing cache with {} entries", self.len());
        self.notifier.shutdown();
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.read();
        f.debug_struct("LruCache")
            .field("len", &core.len())
            .field("capacity", &core.capacity())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl<V> ConcurrentCache<V> for LruCache<V>
where
    V: Send + Sync + 'static,
{
    fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        LruCache::get(self, key)
    }

    fn put_arc<'k>(&self, key: impl Into<Option<&'k str>>, value: Arc<V>) -> Result<(), CacheError> {
        LruCache::put_arc(self, key, value)
    }

    fn peek<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<Arc<V>> {
        LruCache::peek(self, key)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }

    fn subscribe_observer(&self, observer: Arc<dyn EvictionObserver>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        LruCache::unsubscribe(self, id)
    }
}
