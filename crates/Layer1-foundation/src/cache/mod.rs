//! # Plexus Cache Backends
//!
//! Key-value stores used by the plugin framework's caching discovery
//! decorator to keep computed definition sets across requests.
//!
//! ## Design
//!
//! - Entries never expire on a timer. Invalidation is push based: whoever
//!   owns "something changed" (module install, config save) calls
//!   [`CacheBackend::delete`] or [`CacheBackend::invalidate_tags`].
//! - A miss and an unavailable store look the same to callers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plexus_foundation::cache::{CacheBackend, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! backend.set("plugins:block", json!({...}), &["plugins".into()]);
//! backend.invalidate_tags(&["plugins".into()]);
//! ```

pub mod backend;
pub mod memory;
pub mod util;

pub use backend::{CacheBackend, CacheEntry, NullBackend};
pub use memory::{MemoryBackend, MemoryBackendStats, DEFAULT_MAX_ENTRIES};
pub use util::{LruCache, LruCacheStats};

use crate::config::CacheSettings;
use std::sync::Arc;

/// Build the backend described by cache settings
///
/// Disabled caching yields a [`NullBackend`].
pub fn backend_from_settings(settings: &CacheSettings) -> Arc<dyn CacheBackend> {
    if settings.enabled {
        Arc::new(MemoryBackend::from_settings(settings))
    } else {
        Arc::new(NullBackend)
    }
}
