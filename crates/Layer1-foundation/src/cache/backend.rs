//! Cache backend contract
//!
//! The plugin framework only ever reads (`get`) and writes (`set`) through
//! this trait. `delete`, `invalidate_tags` and `clear` exist for the external
//! collaborators that own cache clearing (module installs, config saves).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A cached value together with its invalidation tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached payload
    pub data: Value,
    /// Tags that invalidate this entry
    pub tags: Vec<String>,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: Value, tags: Vec<String>) -> Self {
        Self {
            data,
            tags,
            created_at: Utc::now(),
        }
    }

    /// Whether any of the given tags is attached to this entry
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Key-value cache store with tag based invalidation
///
/// Implementations must treat a miss, an unavailable store and a corrupt
/// entry the same way: return `None` from `get`.
pub trait CacheBackend: Send + Sync {
    /// Look up an entry
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store a value with invalidation tags (last write wins)
    fn set(&self, key: &str, data: Value, tags: &[String]);

    /// Remove a single key
    fn delete(&self, key: &str);

    /// Remove every entry carrying at least one of `tags`
    fn invalidate_tags(&self, tags: &[String]);

    /// Remove everything
    fn clear(&self);
}

/// Backend that never stores anything
///
/// Used when caching is disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl CacheBackend for NullBackend {
    fn get(&self, _key: &str) -> Option<CacheEntry> {
        None
    }

    fn set(&self, _key: &str, _data: Value, _tags: &[String]) {}

    fn delete(&self, _key: &str) {}

    fn invalidate_tags(&self, _tags: &[String]) {}

    fn clear(&self) {}
}
