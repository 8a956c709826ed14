//! Eviction notification: observer subscriptions and the asynchronous
//! delivery thread.
//!
//! Every capacity eviction is delivered once to each registered
//! [`EvictionObserver`], off the thread that caused it. Delivery is
//! best-effort: there is no retry, and a re-insert of the evicted key may
//! become visible before the notice for its eviction arrives.

pub mod notifier;
pub mod observer;

pub(crate) use notifier::EvictionNotifier;
pub use notifier::{NotifierConfig, NotifierStats, OverflowPolicy};
pub use observer::{EvictionObserver, FnObserver, ObserverError, SubscriptionId};
