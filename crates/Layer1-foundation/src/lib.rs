//! # plexus-foundation
//!
//! Foundation layer for Plexus:
//! - Error: 플러그인 프레임워크 에러 분류 (NotFound / InvalidDefinition / Instantiation)
//! - Cache: 정의 캐시 백엔드 (태그 기반 무효화)
//! - Container: 의존성 주입 서비스 컨테이너
//! - Config: 통합 설정 (캐시, 디스커버리)
//! - Telemetry: tracing 구독자 설치
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  plexus-core (Discovery → Decorators → Manager/Factory) │
//! │                     │                                   │
//! │          ┌──────────┼──────────────┐                    │
//! │          ▼          ▼              ▼                    │
//! │   CacheBackend  ServiceContainer  PlexusConfig          │
//! │   (Memory/Null) (DI for plugins)  (toml/json)           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod telemetry;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Cache (캐시 백엔드)
// ============================================================================
pub use cache::{
    backend_from_settings, CacheBackend, CacheEntry, MemoryBackend, MemoryBackendStats,
    NullBackend,
};

// ============================================================================
// Container (서비스 컨테이너)
// ============================================================================
pub use container::{Service, ServiceContainer, ServiceFactoryFn};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    CacheOverrides, CacheSettings, ConfigStore, DiscoveryOverrides, DiscoverySettings,
    PlexusConfig, PlexusConfigOverrides, PLEXUS_CONFIG_FILE,
};

// ============================================================================
// Telemetry
// ============================================================================
pub use telemetry::init_tracing;

/// Layer1 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_backend_from_settings() {
        let mut settings = CacheSettings::default();
        let backend = backend_from_settings(&settings);
        backend.set("k", serde_json::json!(1), &[]);
        assert!(backend.get("k").is_some());

        settings.enabled = false;
        let backend = backend_from_settings(&settings);
        backend.set("k", serde_json::json!(1), &[]);
        assert!(backend.get("k").is_none());
    }
}
