//! # Plugin System
//!
//! 플러그인 정의 발견, 파생, 인스턴스 생성
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DefaultPluginManager                       │
//! │   defaults ─▶ processors (ProviderFilter, ...)               │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │ Discovery chain                                        │  │
//! │  │  Process ─▶ StaticMerge ─▶ Derivative ─▶ Cached ─▶ raw │  │
//! │  │                              │             │        │  │  │
//! │  │                     DeriverRegistry  CacheBackend   │  │  │
//! │  │                                   Static / Yaml / Annotated│
//! │  └───────────────────────────────────────────────────────┘  │
//! │                          │                                   │
//! │  Factory (Default / Container) ─▶ ClassRegistry              │
//! │                          │                                   │
//! │               Box<dyn PluginInstance>                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let discovery = CachedDiscovery::from_settings(
//!     YamlDiscovery::new("block", modules),
//!     backend_from_settings(&config.cache),
//!     &config.cache,
//! );
//! let manager = DefaultPluginManager::new("block", discovery, DefaultFactory::new(classes))
//!     .with_defaults(defaults);
//!
//! let block = manager.create_instance("system_powered_by", Configuration::new())?;
//! ```

pub mod decorator;
pub mod definition;
pub mod deriver;
pub mod discovery;
pub mod factory;
pub mod manager;
pub mod mapper;
pub mod provider;

pub use decorator::{
    CachedDiscovery, DerivativeDiscovery, DiscoveryState, ProcessDiscovery, ProcessFn, RegisterFn,
    StaticMergeDiscovery,
};
pub use definition::{
    encode_derivative_id, split_derivative_id, Configuration, DefinitionStore, PluginDefinition,
    DERIVATIVE_SEPARATOR,
};
pub use deriver::{DerivativeCache, Deriver, DeriverRegistry, FnDeriver};
pub use discovery::{
    AnnotatedClassDiscovery, Discovery, DiscoveryProblem, StaticDiscovery, YamlDiscovery,
    YamlLayout, METADATA_FENCE,
};
pub use factory::{
    ClassRegistry, ConfigurablePlugin, ContainerFactory, ContainerFactoryPlugin, DefaultFactory,
    Factory, PluginClass, PluginInstance,
};
pub use manager::{DefaultPluginManager, DefinitionProcessor, PluginManager};
pub use mapper::{ExtensionMapper, InstanceMapper};
pub use provider::{EnabledProviders, ProviderFilter, ProviderList, BUILTIN_PROVIDERS};
