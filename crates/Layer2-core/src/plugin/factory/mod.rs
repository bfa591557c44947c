//! Plugin Factory - 정의 + 설정 → 인스턴스
//!
//! 팩토리는 정의를 다시 조회하거나 가공하지 않습니다. 정의 해석은
//! 매니저가 끝낸 뒤 넘겨줍니다.

mod class;

pub use class::{
    ClassRegistry, ConfigurablePlugin, ContainerFactoryPlugin, PluginClass, PluginInstance,
};

use crate::plugin::definition::{Configuration, PluginDefinition};
use plexus_foundation::{Error, Result, ServiceContainer};
use std::sync::Arc;
use tracing::debug;

/// 인스턴스 생성 프로토콜
pub trait Factory: Send + Sync {
    fn create_instance(
        &self,
        plugin_id: &str,
        definition: &PluginDefinition,
        configuration: Configuration,
    ) -> Result<Box<dyn PluginInstance>>;
}

/// 정의의 `class`를 레지스트리에서 찾기
fn resolve_class(
    classes: &ClassRegistry,
    plugin_id: &str,
    definition: &PluginDefinition,
) -> Result<PluginClass> {
    let class = definition
        .class()
        .ok_or_else(|| Error::invalid_definition(plugin_id, "the plugin did not specify a class"))?;

    classes.get(class).ok_or_else(|| Error::ClassNotFound {
        plugin_id: plugin_id.to_string(),
        class: class.to_string(),
    })
}

// ============================================================================
// DefaultFactory
// ============================================================================

/// 일반 생성자만 사용하는 팩토리
#[derive(Debug, Clone)]
pub struct DefaultFactory {
    classes: Arc<ClassRegistry>,
}

impl DefaultFactory {
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self { classes }
    }
}

impl Factory for DefaultFactory {
    fn create_instance(
        &self,
        plugin_id: &str,
        definition: &PluginDefinition,
        configuration: Configuration,
    ) -> Result<Box<dyn PluginInstance>> {
        let class = resolve_class(&self.classes, plugin_id, definition)?;
        debug!("Creating '{}' ({:?})", plugin_id, definition.class());

        match class.construct(configuration, plugin_id, definition) {
            Some(result) => result.map_err(|e| Error::instantiation(plugin_id, e)),
            None => Err(Error::instantiation(
                plugin_id,
                anyhow::anyhow!(
                    "class '{}' can only be constructed with a service container",
                    definition.class().unwrap_or_default()
                ),
            )),
        }
    }
}

// ============================================================================
// ContainerFactory
// ============================================================================

/// 컨테이너 인식 생성을 우선하는 팩토리
#[derive(Debug, Clone)]
pub struct ContainerFactory {
    classes: Arc<ClassRegistry>,
    container: Arc<ServiceContainer>,
}

impl ContainerFactory {
    pub fn new(classes: Arc<ClassRegistry>, container: Arc<ServiceContainer>) -> Self {
        Self { classes, container }
    }

    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }
}

impl Factory for ContainerFactory {
    fn create_instance(
        &self,
        plugin_id: &str,
        definition: &PluginDefinition,
        configuration: Configuration,
    ) -> Result<Box<dyn PluginInstance>> {
        let class = resolve_class(&self.classes, plugin_id, definition)?;

        let result = if class.is_container_aware() {
            debug!("Creating '{}' with service container", plugin_id);
            class.construct_with_container(&self.container, configuration, plugin_id, definition)
        } else {
            debug!("Creating '{}'", plugin_id);
            class.construct(configuration, plugin_id, definition)
        };

        match result {
            Some(result) => result.map_err(|e| Error::instantiation(plugin_id, e)),
            None => Err(Error::instantiation(
                plugin_id,
                anyhow::anyhow!("class has no registered constructor"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::any::Any;

    /// 설정을 그대로 보관하는 위젯
    struct Widget {
        plugin_id: String,
        definition: PluginDefinition,
        configuration: Configuration,
        greeting: Option<String>,
    }

    impl PluginInstance for Widget {
        fn plugin_id(&self) -> &str {
            &self.plugin_id
        }
        fn definition(&self) -> &PluginDefinition {
            &self.definition
        }
        fn configuration(&self) -> &Configuration {
            &self.configuration
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl ConfigurablePlugin for Widget {
        fn create(
            configuration: Configuration,
            plugin_id: &str,
            definition: &PluginDefinition,
        ) -> anyhow::Result<Self> {
            if configuration.get("setting") == Some(&Value::Null) {
                anyhow::bail!("setting must not be null");
            }
            Ok(Self {
                plugin_id: plugin_id.to_string(),
                definition: definition.clone(),
                configuration,
                greeting: None,
            })
        }
    }

    impl ContainerFactoryPlugin for Widget {
        fn create_with_container(
            container: &ServiceContainer,
            configuration: Configuration,
            plugin_id: &str,
            definition: &PluginDefinition,
        ) -> anyhow::Result<Self> {
            let greeting = container.get_typed::<String>("greeting")?;
            let mut widget = Self::create(configuration, plugin_id, definition)?;
            widget.greeting = Some(greeting.as_ref().clone());
            Ok(widget)
        }
    }

    fn config(value: Value) -> Configuration {
        value.as_object().cloned().unwrap_or_default()
    }

    fn widget_definition() -> PluginDefinition {
        PluginDefinition::new("foo").with("class", "Widget")
    }

    #[test]
    fn test_default_factory_constructs_widget() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register::<Widget>("Widget");
        let factory = DefaultFactory::new(classes);

        let instance = factory
            .create_instance("foo", &widget_definition(), config(json!({ "setting": 1 })))
            .unwrap();

        let widget = instance.downcast_ref::<Widget>().unwrap();
        assert_eq!(widget.plugin_id(), "foo");
        assert_eq!(widget.configuration().get("setting"), Some(&json!(1)));
        assert_eq!(widget.definition().class(), Some("Widget"));
    }

    #[test]
    fn test_missing_and_unknown_class() {
        let factory = DefaultFactory::new(Arc::new(ClassRegistry::new()));

        let err = factory
            .create_instance("foo", &PluginDefinition::new("foo"), Configuration::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));

        let err = factory
            .create_instance("foo", &widget_definition(), Configuration::new())
            .unwrap_err();
        assert!(matches!(err, Error::ClassNotFound { ref class, .. } if class == "Widget"));
    }

    #[test]
    fn test_constructor_failure_is_instantiation_error() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register::<Widget>("Widget");
        let factory = DefaultFactory::new(classes);

        let err = factory
            .create_instance("foo", &widget_definition(), config(json!({ "setting": null })))
            .unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
        assert!(err.to_string().contains("setting must not be null"));
    }

    #[test]
    fn test_default_factory_rejects_container_only_class() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register_container_aware::<Widget>("Widget");
        let factory = DefaultFactory::new(classes);

        let err = factory
            .create_instance("foo", &widget_definition(), Configuration::new())
            .unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_container_factory_prefers_container_constructor() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register_both::<Widget>("Widget");
        let container = Arc::new(ServiceContainer::new());
        container.set("greeting", Arc::new("hello".to_string()));

        let factory = ContainerFactory::new(classes.clone(), container);
        let instance = factory
            .create_instance("foo", &widget_definition(), config(json!({ "setting": 2 })))
            .unwrap();
        let widget = instance.downcast_ref::<Widget>().unwrap();
        assert_eq!(widget.greeting.as_deref(), Some("hello"));

        // 컨테이너 서비스가 없으면 생성 실패
        let empty = ContainerFactory::new(classes, Arc::new(ServiceContainer::new()));
        let err = empty
            .create_instance("foo", &widget_definition(), Configuration::new())
            .unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_container_factory_falls_back_to_plain() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register::<Widget>("Widget");
        let factory = ContainerFactory::new(classes, Arc::new(ServiceContainer::new()));

        let instance = factory
            .create_instance("foo", &widget_definition(), Configuration::new())
            .unwrap();
        assert!(instance.downcast_ref::<Widget>().unwrap().greeting.is_none());
    }
}
