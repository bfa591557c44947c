//! Lightweight LRU Cache implementation
//!
//! Bounds the in-memory cache backend. Eviction only happens under
//! capacity pressure; entries carry no TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

/// A simple LRU (Least Recently Used) cache
///
/// Prioritizes simplicity over maximum performance: eviction scans for the
/// oldest access stamp, which is fine for the handful of plugin types a
/// process caches.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, LruEntry<V>>,
    capacity: usize,
    /// Access counter for LRU tracking
    access_counter: u64,
}

#[derive(Debug)]
struct LruEntry<V> {
    value: V,
    last_access: u64,
    created_at: Instant,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a new LRU cache with the given capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            capacity,
            access_counter: 0,
        }
    }

    /// Get a reference to a cached value
    ///
    /// Updates the access time for LRU tracking.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.access_counter += 1;
        let counter = self.access_counter;
        self.entries.get_mut(key).map(|entry| {
            entry.last_access = counter;
            &entry.value
        })
    }

    /// Check if a key exists without updating access time
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value into the cache
    ///
    /// If the cache is at capacity, the least recently used item is evicted.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.access_counter += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_access = self.access_counter;
            return Some(std::mem::replace(&mut entry.value, value));
        }

        while self.entries.len() >= self.capacity {
            if self.evict_lru().is_none() {
                break;
            }
        }

        self.entries.insert(
            key,
            LruEntry {
                value,
                last_access: self.access_counter,
                created_at: Instant::now(),
            },
        );

        None
    }

    /// Remove a specific key from the cache
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Remove all entries not matching a predicate
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.entries.retain(|k, e| f(k, &e.value));
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Evict the least recently used entry, returning its key
    fn evict_lru(&mut self) -> Option<K> {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&lru_key);
        Some(lru_key)
    }

    /// Get cache statistics
    pub fn stats(&self) -> LruCacheStats {
        LruCacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            oldest_entry: self.entries.values().map(|e| e.created_at).min(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct LruCacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub oldest_entry: Option<Instant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(3);

        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        cache.insert("b", 2);

        // Access "a" to make it more recent
        cache.get(&"a");

        // Insert "c", should evict "b" (least recently used)
        cache.insert("c", 3);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_update() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        let old = cache.insert("a", 10);

        assert_eq!(old, Some(1));
        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = LruCache::new(0);
        cache.insert("a", 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retain_and_stats() {
        let mut cache = LruCache::new(4);
        cache.insert("keep", 1);
        cache.insert("drop", 2);

        cache.retain(|k, _| *k != "drop");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.capacity, 4);
        assert!(stats.oldest_entry.is_some());
        assert!(cache.contains(&"keep"));
    }
}
