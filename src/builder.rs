//! Cache configuration and builder.
//!
//! Collects capacity, sharding and notifier settings, validates them once and
//! constructs either cache flavour.
//!
//! ## Example
//!
//! ```rust
//! use evictkit::builder::CacheBuilder;
//! use evictkit::notify::OverflowPolicy;
//!
//! let cache = CacheBuilder::new(100)
//!     .queue_capacity(64)
//!     .overflow(OverflowPolicy::Block)
//!     .thread_name("sessions-evict")
//!     .build::<String>()
//!     .unwrap();
//! cache.put("user:1", "alice".to_string()).unwrap();
//!
//! let sharded = CacheBuilder::new(1_000)
//!     .shards(8)
//!     .build_sharded::<u64>()
//!     .unwrap();
//! assert_eq!(sharded.shard_count(), 8);
//! ```

use crate::cache::LruCache;
use crate::error::CacheError;
use crate::notify::{NotifierConfig, OverflowPolicy};
use crate::sharded::ShardedLruCache;

pub const DEFAULT_SHARDS: usize = 16;

/// Everything needed to construct a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries, across all shards.
    pub capacity: usize,
    /// Shard count for [`ShardedLruCache`]; ignored by [`LruCache`]. Defaults
    /// to [`DEFAULT_SHARDS`], lowered to `capacity` for small caches.
    pub shards: usize,
    /// Seed for key-to-shard hashing.
    pub shard_seed: u64,
    pub notifier: NotifierConfig,
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            shards: DEFAULT_SHARDS.min(capacity).max(1),
            shard_seed: 0,
            notifier: NotifierConfig::default(),
        }
    }

    /// Checks the settings used by a single-lock cache.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        self.notifier.validate()
    }

    /// Checks the settings used by a sharded cache. Every shard needs room for
    /// at least one entry.
    pub fn validate_sharded(&self) -> Result<(), CacheError> {
        self.validate()?;
        if self.shards == 0 {
            return Err(CacheError::InvalidConfig("shards must be > 0".to_string()));
        }
        if self.shards > self.capacity {
            return Err(CacheError::InvalidConfig(format!(
                "{} shards cannot share a capacity of {}",
                self.shards, self.capacity
            )));
        }
        Ok(())
    }
}

/// Builder for [`LruCache`] and [`ShardedLruCache`].
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            config: CacheConfig::new(capacity),
        }
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    pub fn shard_seed(mut self, seed: u64) -> Self {
        self.config.shard_seed = seed;
        self
    }

    /// Maximum number of undelivered eviction notices.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.notifier.queue_capacity = capacity;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.config.notifier.overflow = policy;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.notifier.thread_name = name.into();
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Builds a single-lock cache with global LRU order.
    pub fn build<V>(self) -> Result<LruCache<V>, CacheError>
    where
        V: Send + Sync + 'static,
    {
        self.config.validate()?;
        LruCache::with_notifier(self.config.capacity, &self.config.notifier)
    }

    /// Builds a cache split into independently locked shards.
    pub fn build_sharded<V>(self) -> Result<ShardedLruCache<V>, CacheError>
    where
        V: Send + Sync + 'static,
    {
        ShardedLruCache::from_config(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let builder = CacheBuilder::new(10);
        let config = builder.config();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.shards, 10);
        assert_eq!(config.notifier, NotifierConfig::default());

        assert_eq!(CacheBuilder::new(1_000).config().shards, DEFAULT_SHARDS);
    }

    #[test]
    fn default_shards_fit_small_capacity() {
        let sharded = CacheBuilder::new(8).build_sharded::<u8>().unwrap();
        assert_eq!(sharded.shard_count(), 8);
        assert_eq!(sharded.capacity(), 8);

        let single_slot = CacheBuilder::new(1).build_sharded::<u8>().unwrap();
        assert_eq!(single_slot.shard_count(), 1);
    }

    #[test]
    fn explicit_shards_are_still_checked() {
        assert!(matches!(
            CacheBuilder::new(8).shards(9).build_sharded::<u8>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn setters_update_config() {
        let builder = CacheBuilder::new(10)
            .shards(2)
            .shard_seed(42)
            .queue_capacity(8)
            .overflow(OverflowPolicy::Block)
            .thread_name("custom");
        let config = builder.config();
        assert_eq!(config.shards, 2);
        assert_eq!(config.shard_seed, 42);
        assert_eq!(config.notifier.queue_capacity, 8);
        assert_eq!(config.notifier.overflow, OverflowPolicy::Block);
        assert_eq!(config.notifier.thread_name, "custom");
    }

    #[test]
    fn build_rejects_zero_capacity() {
        let err = CacheBuilder::new(0).build::<u8>().unwrap_err();
        assert!(matches!(err, CacheError::InvalidCapacity { capacity: 0 }));
    }

    #[test]
    fn build_rejects_zero_queue() {
        let err = CacheBuilder::new(4).queue_capacity(0).build::<u8>().unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
    }

    #[test]
    fn sharded_validation() {
        assert!(matches!(
            CacheBuilder::new(4).shards(0).build_sharded::<u8>(),
            Err(CacheError::InvalidConfig(_))
        ));
        assert!(matches!(
            CacheBuilder::new(4).shards(5).build_sharded::<u8>(),
            Err(CacheError::InvalidConfig(_))
        ));
        // The shard count is irrelevant for the single-lock cache.
        assert!(CacheBuilder::new(4).shards(5).build::<u8>().is_ok());
    }

    #[test]
    fn build_capacity_is_honored() {
        let cache = CacheBuilder::new(2).build::<String>().unwrap();
        cache.put("1", "one".to_string()).unwrap();
        cache.put("2", "two".to_string()).unwrap();
        cache.put("3", "three".to_string()).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("1"));
        assert!(cache.contains("2"));
        assert!(cache.contains("3"));
    }

    #[test]
    fn from_config_round_trips() {
        let mut config = CacheConfig::new(12);
        config.shards = 3;
        let sharded = CacheBuilder::from_config(config.clone())
            .build_sharded::<u8>()
            .unwrap();
        assert_eq!(sharded.capacity(), 12);
        assert_eq!(sharded.shard_count(), 3);
    }
}
