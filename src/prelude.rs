pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::LruCache;
pub use crate::error::{CacheError, InvariantError};
pub use crate::notify::{
    EvictionObserver, FnObserver, NotifierConfig, NotifierStats, ObserverError, OverflowPolicy,
    SubscriptionId,
};
pub use crate::sharded::ShardedLruCache;
pub use crate::traits::ConcurrentCache;
