//! plexus-core: Plugin Framework Core
//!
//! Layer2 - 플러그인 정의 발견과 인스턴스 생성
//!
//! # 주요 모듈
//!
//! - `plugin::definition`: 정의 / 정의 저장소
//! - `plugin::discovery`: 정적, YAML 파일, 어노테이션 소스 디스커버리
//! - `plugin::decorator`: 캐시, 파생, 정적 병합, 가공 데코레이터
//! - `plugin::deriver`: 파생기와 레지스트리
//! - `plugin::factory`: 클래스 레지스트리와 팩토리
//! - `plugin::manager`: 플러그인 매니저
//!
//! # 사용 예시
//!
//! ```ignore
//! use plexus_core::{DefaultPluginManager, PluginManager, YamlDiscovery, DefaultFactory};
//!
//! let discovery = YamlDiscovery::new("block", vec![("system", "modules/system")]);
//! let manager = DefaultPluginManager::new("block", discovery, DefaultFactory::new(classes));
//!
//! for (id, definition) in manager.definitions()? {
//!     println!("{} → {:?}", id, definition.class());
//! }
//! ```

pub mod plugin;

// Re-exports: Definition
pub use plugin::{
    encode_derivative_id, split_derivative_id, Configuration, DefinitionStore, PluginDefinition,
    DERIVATIVE_SEPARATOR,
};

// Re-exports: Discovery
pub use plugin::{
    AnnotatedClassDiscovery, Discovery, DiscoveryProblem, StaticDiscovery, YamlDiscovery,
    YamlLayout, METADATA_FENCE,
};

// Re-exports: Decorators
pub use plugin::{
    CachedDiscovery, DerivativeDiscovery, DiscoveryState, ProcessDiscovery, StaticMergeDiscovery,
};

// Re-exports: Derivers
pub use plugin::{DerivativeCache, Deriver, DeriverRegistry, FnDeriver};

// Re-exports: Factory
pub use plugin::{
    ClassRegistry, ConfigurablePlugin, ContainerFactory, ContainerFactoryPlugin, DefaultFactory,
    Factory, PluginClass, PluginInstance,
};

// Re-exports: Manager
pub use plugin::{
    DefaultPluginManager, DefinitionProcessor, EnabledProviders, ExtensionMapper, InstanceMapper,
    PluginManager, ProviderFilter, ProviderList,
};

// Re-exports: Foundation
pub use plexus_foundation::{Error, Result};
