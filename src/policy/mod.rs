pub mod lru;

pub use lru::{Evicted, LruCore};
