//! evictkit: a concurrent, string-keyed LRU cache that reports capacity
//! evictions to subscribed observers on a background thread.
//!
//! - [`LruCache`]: one lock, global least-recently-used order.
//! - [`ShardedLruCache`]: a lock per shard, LRU order within each shard.
//! - [`CacheBuilder`]: capacity, sharding and notifier settings.
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache: LruCache<String> = LruCache::new(2).unwrap();
//! cache.subscribe_fn(|key| {
//!     println!("evicted {key}");
//!     Ok(())
//! });
//! cache.put("a", "1".to_string()).unwrap();
//! cache.put("b", "2".to_string()).unwrap();
//! cache.put("c", "3".to_string()).unwrap();
//! assert!(cache.get("a").is_none());
//! ```

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod notify;
pub mod policy;
pub mod prelude;
pub mod sharded;
pub mod traits;

pub use builder::{CacheBuilder, CacheConfig};
pub use cache::LruCache;
pub use error::CacheError;
pub use sharded::ShardedLruCache;
