//! Bounded eviction queue drained by a dedicated notifier thread.
//!
//! ## Architecture
//!
//! ```text
//!   put() ── evicts "a" ──► [lock released] ──► notify("a")
//!                                                  │
//!                                   try_send / send│
//!                                                  ▼
//!                       ┌──────────────────────────────────────┐
//!                       │ crossbeam bounded queue (capacity N) │
//!                       └──────────────────┬───────────────────┘
//!                                          │ recv
//!                                          ▼
//!                       ┌──────────────────────────────────────┐
//!                       │ notifier thread                      │
//!                       │   for observer in registry.snapshot()│
//!                       │       catch_unwind(on_evict("a"))    │
//!                       └──────────────────────────────────────┘
//! ```
//!
//! The cache only ever enqueues. Observer latency, errors and panics stay on
//! the notifier thread. When the queue is full the configured
//! [`OverflowPolicy`] decides whether the event is dropped or the evicting
//! `put` waits for space.
//!
//! Shutdown closes the queue, lets the thread drain what is already queued
//! and joins it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, trace, warn};

use crate::error::CacheError;
use crate::notify::observer::{ObserverRegistry, SharedObserver, SubscriptionId};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_THREAD_NAME: &str = "evictkit-notify";

/// What to do with an eviction event when the notifier queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the new event and count it in [`NotifierStats::dropped`].
    /// `put` never waits on the notifier.
    #[default]
    DropNewest,
    /// Make the evicting `put` wait until the queue has room. Delivery is
    /// complete, but a slow observer throttles writers. Observers that write
    /// to the same cache must not be combined with this policy.
    Block,
}

/// Notifier settings. See [`CacheBuilder`](crate::builder::CacheBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Maximum number of undelivered eviction events.
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Name given to the notifier thread.
    pub thread_name: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.queue_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "notifier queue_capacity must be > 0".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(CacheError::InvalidConfig(
                "notifier thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time delivery counters.
///
/// Counters are read one at a time, so a snapshot taken while the notifier is
/// busy may be mid-update across fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifierStats {
    /// Events accepted into the queue.
    pub enqueued: u64,
    /// Events discarded because the queue was full or closed.
    pub dropped: u64,
    /// Successful `on_evict` calls.
    pub delivered: u64,
    /// `on_evict` calls that returned `Err` or panicked.
    pub failed: u64,
    /// Events waiting in the queue.
    pub pending: usize,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

struct EvictionEvent {
    key: Arc<str>,
}

/// Owns the observer registry, the queue sender and the notifier thread.
pub(crate) struct EvictionNotifier {
    sender: Option<Sender<EvictionEvent>>,
    registry: Arc<ObserverRegistry>,
    counters: Arc<Counters>,
    overflow: OverflowPolicy,
    worker: Option<JoinHandle<()>>,
}

impl EvictionNotifier {
    pub(crate) fn start(config: &NotifierConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let (sender, receiver) = bounded(config.queue_capacity);
        let registry = Arc::new(ObserverRegistry::new());
        let counters = Arc::new(Counters::default());

        let worker = {
            let registry = Arc::clone(&registry);
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || run_worker(receiver, registry, counters))
                .map_err(CacheError::NotifierSpawn)?
        };

        info!(
            "eviction notifier '{}' started (queue capacity {}, overflow {:?})",
            config.thread_name, config.queue_capacity, config.overflow
        );

        Ok(Self {
            sender: Some(sender),
            registry,
            counters,
            overflow: config.overflow,
            worker: Some(worker),
        })
    }

    pub(crate) fn subscribe(&self, observer: SharedObserver) -> SubscriptionId {
        self.registry.subscribe(observer)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.registry.len()
    }

    /// Queues `key` for delivery. Must be called without holding a cache lock.
    pub(crate) fn notify(&self, key: Arc<str>) {
        if self.registry.is_empty() {
            trace!("no eviction observers, skipping notice for {:?}", key);
            return;
        }
        let Some(sender) = self.sender.as_ref() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let event = EvictionEvent { key };
        let outcome = match self.overflow {
            OverflowPolicy::DropNewest => sender.try_send(event),
            OverflowPolicy::Block => sender
                .send(event)
                .map_err(|err| TrySendError::Disconnected(err.into_inner())),
        };

        match outcome {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            },
            Err(TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "eviction queue full, dropping notice for {:?}",
                    event.key
                );
            },
            Err(TrySendError::Disconnected(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "eviction notifier stopped, dropping notice for {:?}",
                    event.key
                );
            },
        }
    }

    pub(crate) fn stats(&self) -> NotifierStats {
        NotifierStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            pending: self.sender.as_ref().map_or(0, Sender::len),
        }
    }

    /// Closes the queue, waits for queued events to be delivered and joins
    /// the notifier thread. Later calls do nothing.
    pub(crate) fn shutdown(&mut self) {
        drop(self.sender.take());

        let Some(handle) = self.worker.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Last cache handle dropped by an observer; the thread exits once
            // it returns from dispatch.
            debug!("eviction notifier released from its own thread, detaching");
            return;
        }
        if let Err(panic) = handle.join() {
            error!("eviction notifier thread panicked: {:?}", panic);
        }
    }
}

impl Drop for EvictionNotifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for EvictionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionNotifier")
            .field("observers", &self.registry.len())
            .field("overflow", &self.overflow)
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

fn run_worker(receiver: Receiver<EvictionEvent>, registry: Arc<ObserverRegistry>, counters: Arc<Counters>) {
    for event in receiver.iter() {
        dispatch(&event.key, &registry, &counters);
    }
    info!("eviction notifier stopped");
}

fn dispatch(key: &str, registry: &ObserverRegistry, counters: &Counters) {
    for (id, observer) in registry.snapshot() {
        match panic::catch_unwind(AssertUnwindSafe(|| observer.on_evict(key))) {
            Ok(Ok(())) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
            },
            Ok(Err(err)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("eviction observer {} failed for {:?}: {}", id, key, err);
            },
            Err(_) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("eviction observer {} panicked for {:?}", id, key);
            },
        }
    }
}
