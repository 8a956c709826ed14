//! Error types for evictkit.
//!
//! ## Key Components
//!
//! - [`CacheError`]: every failure a caller can observe from constructing or
//!   mutating a cache.
//! - [`InvariantError`]: internal structure found inconsistent. Produced by
//!   `check_invariants` and by the eviction path if the recency list and the
//!   index ever disagree.
//!
//! A lookup miss is not an error; `get` returns `None` for absent keys and for
//! the null key.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::error::CacheError;
//! use evictkit::LruCache;
//!
//! let err = LruCache::<u32>::new(0).unwrap_err();
//! assert!(matches!(err, CacheError::InvalidCapacity { capacity: 0 }));
//!
//! let cache: LruCache<u32> = LruCache::new(2).unwrap();
//! assert!(matches!(cache.put(None::<&str>, 1), Err(CacheError::NullKey)));
//! ```

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors surfaced by cache construction and mutation.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Capacity must be at least one entry.
    #[error("capacity must be > 0, got {capacity}")]
    InvalidCapacity { capacity: usize },

    /// `put` was called without a key.
    #[error("cannot store an entry under a null key")]
    NullKey,

    /// A builder or config parameter is out of range.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The eviction notifier thread could not be started.
    #[error("failed to spawn eviction notifier thread")]
    NotifierSpawn(#[source] io::Error),

    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache invariant violated: {}", self.0)
    }
}

impl std::error::Error for InvariantError {}
