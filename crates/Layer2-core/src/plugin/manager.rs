//! Plugin Manager - 플러그인 타입 하나의 정의 조회와 인스턴스 생성
//!
//! ```text
//! definitions() ─▶ discovery chain ─▶ process_definition (정의마다 1회) ─▶ snapshot
//! create_instance(id) ─▶ definition(id, strict) ─▶ Factory::create_instance
//! ```

use super::definition::{Configuration, DefinitionStore, PluginDefinition};
use super::discovery::Discovery;
use super::factory::{Factory, PluginInstance};
use super::mapper::InstanceMapper;
use plexus_foundation::{Error, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

// ============================================================================
// PluginManager trait
// ============================================================================

/// 플러그인 매니저 프로토콜
pub trait PluginManager: Send + Sync {
    fn plugin_type(&self) -> &str;

    /// 가공된 모든 정의
    fn definitions(&self) -> Result<DefinitionStore>;

    /// 가공된 단일 정의
    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>>;

    fn has_definition(&self, plugin_id: &str) -> bool {
        matches!(self.definition(plugin_id, false), Ok(Some(_)))
    }

    /// 인스턴스 생성
    fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Configuration,
    ) -> Result<Box<dyn PluginInstance>>;

    /// 옵션으로 플러그인을 골라 생성 (일치 없으면 `None`)
    fn get_instance(&self, options: &Value) -> Result<Option<Box<dyn PluginInstance>>>;

    fn clear_cached_definitions(&self);
}

// ============================================================================
// DefinitionProcessor
// ============================================================================

/// 정의 가공기 (기본값 병합 뒤 순서대로 실행)
pub trait DefinitionProcessor: Send + Sync {
    fn process(&self, definition: &mut PluginDefinition, plugin_id: &str) -> Result<()>;
}

impl<F> DefinitionProcessor for F
where
    F: Fn(&mut PluginDefinition, &str) -> Result<()> + Send + Sync,
{
    fn process(&self, definition: &mut PluginDefinition, plugin_id: &str) -> Result<()> {
        self(definition, plugin_id)
    }
}

// ============================================================================
// DefaultPluginManager
// ============================================================================

/// 기본 매니저
pub struct DefaultPluginManager {
    plugin_type: String,
    discovery: Box<dyn Discovery>,
    factory: Box<dyn Factory>,

    /// 모든 정의에 병합할 타입 기본값 (정의 쪽 우선)
    defaults: Map<String, Value>,

    processors: Vec<Box<dyn DefinitionProcessor>>,
    mapper: Option<Box<dyn InstanceMapper>>,

    /// 없는 ID 요청 시 대신 생성할 플러그인
    fallback_plugin_id: Option<String>,
}

impl DefaultPluginManager {
    pub fn new(
        plugin_type: impl Into<String>,
        discovery: impl Discovery + 'static,
        factory: impl Factory + 'static,
    ) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            discovery: Box::new(discovery),
            factory: Box::new(factory),
            defaults: Map::new(),
            processors: Vec::new(),
            mapper: None,
            fallback_plugin_id: None,
        }
    }

    /// 타입 기본값 설정
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// 가공기 추가
    pub fn with_processor(mut self, processor: impl DefinitionProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn with_mapper(mut self, mapper: impl InstanceMapper + 'static) -> Self {
        self.mapper = Some(Box::new(mapper));
        self
    }

    pub fn with_fallback(mut self, plugin_id: impl Into<String>) -> Self {
        self.fallback_plugin_id = Some(plugin_id.into());
        self
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    pub fn discovery(&self) -> &dyn Discovery {
        self.discovery.as_ref()
    }

    /// 기본값 병합 후 가공기 실행
    pub fn process_definition(
        &self,
        definition: &mut PluginDefinition,
        plugin_id: &str,
    ) -> Result<()> {
        definition.merge_defaults(&self.defaults);
        for processor in &self.processors {
            processor.process(definition, plugin_id)?;
        }
        Ok(())
    }

    fn resolve(&self, plugin_id: &str) -> Result<(String, PluginDefinition)> {
        match self.definition(plugin_id, true) {
            Ok(Some(definition)) => Ok((plugin_id.to_string(), definition)),
            Ok(None) => Err(Error::plugin_not_found(plugin_id, &self.plugin_type)),
            Err(e) if e.is_not_found() => {
                let Some(fallback) = self.fallback_plugin_id.as_deref() else {
                    return Err(e);
                };
                warn!(
                    "[{}] '{}' not found, using fallback '{}'",
                    self.plugin_type, plugin_id, fallback
                );
                let definition = self
                    .definition(fallback, true)?
                    .ok_or_else(|| Error::plugin_not_found(fallback, &self.plugin_type))?;
                Ok((fallback.to_string(), definition))
            }
            Err(e) => Err(e),
        }
    }
}

impl PluginManager for DefaultPluginManager {
    fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut definitions = self.discovery.definitions()?;
        definitions.retain(|plugin_id, definition| {
            match self.process_definition(definition, plugin_id) {
                Ok(()) => true,
                Err(e) => {
                    warn!("[{}] Dropping '{}': {}", self.plugin_type, plugin_id, e);
                    false
                }
            }
        });
        debug!("[{}] {} definitions", self.plugin_type, definitions.len());
        Ok(definitions)
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        match self.discovery.definition(plugin_id, exception_on_invalid)? {
            Some(mut definition) => {
                self.process_definition(&mut definition, plugin_id)?;
                Ok(Some(definition))
            }
            None => Ok(None),
        }
    }

    fn create_instance(
        &self,
        plugin_id: &str,
        configuration: Configuration,
    ) -> Result<Box<dyn PluginInstance>> {
        let (resolved_id, definition) = self.resolve(plugin_id)?;
        let instance = self
            .factory
            .create_instance(&resolved_id, &definition, configuration)?;
        info!("[{}] Created '{}'", self.plugin_type, resolved_id);
        Ok(instance)
    }

    fn get_instance(&self, options: &Value) -> Result<Option<Box<dyn PluginInstance>>> {
        let mapper = self.mapper.as_ref().ok_or_else(|| {
            Error::Plugin(format!(
                "plugin type '{}' has no instance mapper",
                self.plugin_type
            ))
        })?;

        let definitions = self.definitions()?;
        let Some(plugin_id) = mapper.plugin_id(options, &definitions) else {
            debug!("[{}] No plugin matches {}", self.plugin_type, options);
            return Ok(None);
        };

        let configuration = options
            .get("configuration")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        self.create_instance(&plugin_id, configuration).map(Some)
    }

    fn clear_cached_definitions(&self) {
        self.discovery.clear_cached_definitions();
    }
}

impl std::fmt::Debug for DefaultPluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPluginManager")
            .field("plugin_type", &self.plugin_type)
            .field("processors", &self.processors.len())
            .field("has_mapper", &self.mapper.is_some())
            .field("fallback_plugin_id", &self.fallback_plugin_id)
            .finish_non_exhaustive()
    }
}
