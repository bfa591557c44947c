//! Cache utilities
//!
//! - `LruCache`: Simple capacity-bounded LRU cache

mod lru;

pub use lru::{LruCache, LruCacheStats};
