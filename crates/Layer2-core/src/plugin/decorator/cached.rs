//! Cached Discovery - 두 단계 정의 캐시 (인스턴스 메모 + 공유 백엔드)
//!
//! Lookup order is memo → backend → inner discovery. Entries never expire
//! on their own; they are dropped by `clear_cached_definitions` or by tag
//! invalidation on the backend.

use crate::plugin::definition::DefinitionStore;
use crate::plugin::discovery::Discovery;
use parking_lot::RwLock;
use plexus_foundation::{CacheBackend, CacheSettings, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 발견 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// 아직 스캔하지 않음 (또는 캐시가 비워짐)
    NotDiscovered,
    /// 인스턴스 메모에 정의 집합이 있음
    Cached,
}

/// 캐시 데코레이터
pub struct CachedDiscovery<D> {
    inner: D,
    backend: Arc<dyn CacheBackend>,
    cache_key: String,
    tags: Vec<String>,
    enabled: AtomicBool,
    memo: RwLock<Option<DefinitionStore>>,
}

impl<D: Discovery> CachedDiscovery<D> {
    /// 고정 키로 생성
    pub fn new(inner: D, backend: Arc<dyn CacheBackend>, cache_key: impl Into<String>) -> Self {
        Self {
            inner,
            backend,
            cache_key: cache_key.into(),
            tags: Vec::new(),
            enabled: AtomicBool::new(true),
            memo: RwLock::new(None),
        }
    }

    /// 설정으로 생성: 키 `{prefix}{plugin_type}`, 기본 태그, 활성 여부
    pub fn from_settings(
        inner: D,
        backend: Arc<dyn CacheBackend>,
        settings: &CacheSettings,
    ) -> Self {
        let cache_key = format!("{}{}", settings.key_prefix, inner.plugin_type());
        let cached = Self::new(inner, backend, cache_key).with_tags(settings.default_tags.clone());
        cached.use_caches(settings.enabled);
        cached
    }

    /// 언어별 키 (`{key}:{language}`)
    pub fn with_language(mut self, language: &str) -> Self {
        self.cache_key = format!("{}:{}", self.cache_key, language);
        self
    }

    /// 무효화 태그 추가
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// 캐시 사용 여부 (끄면 메모와 백엔드 모두 우회)
    pub fn use_caches(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            *self.memo.write() = None;
        }
    }

    pub fn caches_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> DiscoveryState {
        if self.memo.read().is_some() {
            DiscoveryState::Cached
        } else {
            DiscoveryState::NotDiscovered
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn from_backend(&self) -> Option<DefinitionStore> {
        let entry = self.backend.get(&self.cache_key)?;
        match DefinitionStore::from_value(entry.data) {
            Ok(store) => Some(store),
            Err(e) => {
                debug!("[cache] Ignoring undecodable entry {}: {}", self.cache_key, e);
                None
            }
        }
    }
}

impl<D: Discovery> Discovery for CachedDiscovery<D> {
    fn plugin_type(&self) -> &str {
        self.inner.plugin_type()
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        if !self.caches_enabled() {
            return self.inner.definitions();
        }

        if let Some(store) = self.memo.read().as_ref() {
            return Ok(store.clone());
        }

        let store = match self.from_backend() {
            Some(store) => {
                debug!("[cache] Hit {}", self.cache_key);
                store
            }
            None => {
                debug!("[cache] Miss {}", self.cache_key);
                let store = self.inner.definitions()?;
                match store.to_value() {
                    Ok(value) => self.backend.set(&self.cache_key, value, &self.tags),
                    Err(e) => warn!("[cache] Failed to encode {}: {}", self.cache_key, e),
                }
                store
            }
        };

        *self.memo.write() = Some(store.clone());
        Ok(store)
    }

    fn clear_cached_definitions(&self) {
        *self.memo.write() = None;
        if self.caches_enabled() {
            self.backend.delete(&self.cache_key);
        }
        self.inner.clear_cached_definitions();
    }
}
