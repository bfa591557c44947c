//! Plugin classes - 인스턴스 trait, 생성 능력 trait, 클래스 레지스트리
//!
//! 정의의 `class` 값은 `ClassRegistry`에 등록된 이름으로 해석됩니다.
//! 어떤 생성 방식을 지원하는지는 등록할 때의 trait 경계로 결정됩니다.

use crate::plugin::definition::{Configuration, PluginDefinition};
use parking_lot::RwLock;
use plexus_foundation::ServiceContainer;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// PluginInstance
// ============================================================================

/// 생성된 플러그인 인스턴스
pub trait PluginInstance: Any + Send + Sync {
    fn plugin_id(&self) -> &str;

    fn definition(&self) -> &PluginDefinition;

    fn configuration(&self) -> &Configuration;

    fn as_any(&self) -> &dyn Any;
}

impl dyn PluginInstance {
    /// 구체 타입으로 다운캐스트
    pub fn downcast_ref<T: PluginInstance>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: PluginInstance>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl std::fmt::Debug for dyn PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("plugin_id", &self.plugin_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// 생성 능력
// ============================================================================

/// 설정만으로 생성 가능한 플러그인
pub trait ConfigurablePlugin: PluginInstance + Sized {
    fn create(
        configuration: Configuration,
        plugin_id: &str,
        definition: &PluginDefinition,
    ) -> anyhow::Result<Self>;
}

/// 서비스 컨테이너에서 의존성을 받아 생성하는 플러그인
pub trait ContainerFactoryPlugin: PluginInstance + Sized {
    fn create_with_container(
        container: &ServiceContainer,
        configuration: Configuration,
        plugin_id: &str,
        definition: &PluginDefinition,
    ) -> anyhow::Result<Self>;
}

type PlainConstructor = Arc<
    dyn Fn(Configuration, &str, &PluginDefinition) -> anyhow::Result<Box<dyn PluginInstance>>
        + Send
        + Sync,
>;

type ContainerConstructor = Arc<
    dyn Fn(
            &ServiceContainer,
            Configuration,
            &str,
            &PluginDefinition,
        ) -> anyhow::Result<Box<dyn PluginInstance>>
        + Send
        + Sync,
>;

/// 등록된 클래스의 생성자 묶음
#[derive(Clone, Default)]
pub struct PluginClass {
    plain: Option<PlainConstructor>,
    container_aware: Option<ContainerConstructor>,
}

impl PluginClass {
    pub fn is_container_aware(&self) -> bool {
        self.container_aware.is_some()
    }

    pub fn is_plain(&self) -> bool {
        self.plain.is_some()
    }

    /// 일반 생성
    pub fn construct(
        &self,
        configuration: Configuration,
        plugin_id: &str,
        definition: &PluginDefinition,
    ) -> Option<anyhow::Result<Box<dyn PluginInstance>>> {
        self.plain
            .as_ref()
            .map(|construct| construct(configuration, plugin_id, definition))
    }

    /// 컨테이너 인식 생성
    pub fn construct_with_container(
        &self,
        container: &ServiceContainer,
        configuration: Configuration,
        plugin_id: &str,
        definition: &PluginDefinition,
    ) -> Option<anyhow::Result<Box<dyn PluginInstance>>> {
        self.container_aware
            .as_ref()
            .map(|construct| construct(container, configuration, plugin_id, definition))
    }
}

impl std::fmt::Debug for PluginClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginClass")
            .field("plain", &self.is_plain())
            .field("container_aware", &self.is_container_aware())
            .finish()
    }
}

// ============================================================================
// ClassRegistry
// ============================================================================

/// 클래스 이름 → 생성자
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, PluginClass>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 일반 생성 클래스 등록
    pub fn register<T: ConfigurablePlugin>(&self, class: impl Into<String>) {
        let construct: PlainConstructor = Arc::new(
            |configuration: Configuration, plugin_id: &str, definition: &PluginDefinition| {
                T::create(configuration, plugin_id, definition)
                    .map(|instance| Box::new(instance) as Box<dyn PluginInstance>)
            },
        );
        self.classes.write().entry(class.into()).or_default().plain = Some(construct);
    }

    /// 컨테이너 인식 클래스 등록
    pub fn register_container_aware<T: ContainerFactoryPlugin>(&self, class: impl Into<String>) {
        let construct: ContainerConstructor =
            Arc::new(|container: &ServiceContainer,
                      configuration: Configuration,
                      plugin_id: &str,
                      definition: &PluginDefinition| {
                T::create_with_container(container, configuration, plugin_id, definition)
                    .map(|instance| Box::new(instance) as Box<dyn PluginInstance>)
            });
        self.classes
            .write()
            .entry(class.into())
            .or_default()
            .container_aware = Some(construct);
    }

    /// 두 방식 모두 등록
    pub fn register_both<T>(&self, class: impl Into<String>)
    where
        T: ConfigurablePlugin + ContainerFactoryPlugin,
    {
        let class = class.into();
        self.register::<T>(class.clone());
        self.register_container_aware::<T>(class);
    }

    pub fn get(&self, class: &str) -> Option<PluginClass> {
        self.classes.read().get(class).cloned()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.read().contains_key(class)
    }

    pub fn unregister(&self, class: &str) -> bool {
        self.classes.write().remove(class).is_some()
    }

    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}
