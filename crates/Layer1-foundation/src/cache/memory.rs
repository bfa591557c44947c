//! In-memory cache backend
//!
//! Tag-aware store bounded by an LRU. Shared across managers of one process
//! through `Arc<MemoryBackend>`.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::backend::{CacheBackend, CacheEntry};
use super::util::LruCache;
use crate::config::CacheSettings;

/// Default number of keys kept in memory
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// In-memory [`CacheBackend`]
#[derive(Debug)]
pub struct MemoryBackend {
    entries: Mutex<LruCache<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryBackend {
    /// Create a backend with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a backend holding at most `max_entries` keys
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_entries)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a backend from cache settings
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::with_capacity(settings.max_entries)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether a key is present (does not count as a hit)
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(&key.to_string())
    }

    /// Hit / miss counters
    pub fn stats(&self) -> MemoryBackendStats {
        let entries = self.entries.lock();
        MemoryBackendStats {
            entries: entries.len(),
            capacity: entries.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let found = self.entries.lock().get(&key.to_string()).cloned();
        match found {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, key: &str, data: Value, tags: &[String]) {
        debug!("cache set: {} (tags: {:?})", key, tags);
        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry::new(data, tags.to_vec()));
    }

    fn delete(&self, key: &str) {
        self.entries.lock().remove(&key.to_string());
    }

    fn invalidate_tags(&self, tags: &[String]) {
        debug!("cache invalidate tags: {:?}", tags);
        self.entries.lock().retain(|_, entry| !entry.has_any_tag(tags));
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Memory backend statistics
#[derive(Debug, Clone, Default)]
pub struct MemoryBackendStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl MemoryBackendStats {
    /// Hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
