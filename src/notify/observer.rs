//! Eviction observers and the registry that tracks their subscriptions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Error an observer may return from [`EvictionObserver::on_evict`].
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Callback invoked once per eviction with the evicted key.
///
/// Observers run on the cache's notifier thread, never on the thread whose
/// `put` caused the eviction. A returned `Err` or a panic is logged and
/// counted; it never reaches the cache or the other observers.
///
/// An observer may call back into the cache it observes.
pub trait EvictionObserver: Send + Sync + 'static {
    fn on_evict(&self, key: &str) -> Result<(), ObserverError>;
}

/// An [`EvictionObserver`] backed by a closure.
///
/// ```
/// use evictkit::notify::{EvictionObserver, FnObserver};
///
/// let observer = FnObserver::new(|key| {
///     println!("evicted {key}");
///     Ok(())
/// });
/// observer.on_evict("a").unwrap();
/// ```
pub struct FnObserver<F>(pub F);

impl<F> FnObserver<F>
where
    F: Fn(&str) -> Result<(), ObserverError> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EvictionObserver for FnObserver<F>
where
    F: Fn(&str) -> Result<(), ObserverError> + Send + Sync + 'static,
{
    fn on_evict(&self, key: &str) -> Result<(), ObserverError> {
        (self.0)(key)
    }
}

impl<T: EvictionObserver + ?Sized> EvictionObserver for Arc<T> {
    fn on_evict(&self, key: &str) -> Result<(), ObserverError> {
        (**self).on_evict(key)
    }
}

/// Handle returned by `subscribe`; pass it to `unsubscribe` to stop delivery.
///
/// Ids are never reused within one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(crate) type SharedObserver = Arc<dyn EvictionObserver>;

/// Subscription table shared between the cache and the notifier thread.
pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    observers: RwLock<FxHashMap<SubscriptionId, SharedObserver>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: RwLock::new(FxHashMap::default()),
        }
    }

    pub(crate) fn subscribe(&self, observer: SharedObserver) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().insert(id, observer);
        debug!("eviction observer {} subscribed", id);
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.observers.write().remove(&id).is_some();
        if removed {
            debug!("eviction observer {} unsubscribed", id);
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Current observers in subscription order. The read lock is released
    /// before the caller invokes any of them.
    pub(crate) fn snapshot(&self) -> Vec<(SubscriptionId, SharedObserver)> {
        let mut current: Vec<_> = self
            .observers
            .read()
            .iter()
            .map(|(id, obs)| (*id, Arc::clone(obs)))
            .collect();
        current.sort_unstable_by_key(|(id, _)| *id);
        current
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish_non_exhaustive()
    }
}
