//! Config - 플러그인 프레임워크 설정 관리
//!
//! - `plexus.rs` - PlexusConfig 통합 설정 (캐시, 디스커버리)
//! - `store.rs` - TOML/JSON 설정 파일 저장소

mod plexus;
mod store;

pub use plexus::{
    CacheOverrides, CacheSettings, DiscoveryOverrides, DiscoverySettings, PlexusConfig,
    PlexusConfigOverrides, PLEXUS_CONFIG_FILE,
};
pub use store::ConfigStore;
