//! Static Discovery - 명령형으로 등록되는 정의

use super::{not_found_or_none, Discovery};
use crate::plugin::definition::{DefinitionStore, PluginDefinition, ID_KEY};
use plexus_foundation::Result;
use tracing::debug;

/// 외부 탐색 없이 코드로 등록된 정의만 돌려주는 디스커버리
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    plugin_type: String,
    definitions: DefinitionStore,
}

impl StaticDiscovery {
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            definitions: DefinitionStore::new(),
        }
    }

    /// 정의 등록 (같은 ID는 교체)
    ///
    /// 정의에 `id`가 없으면 채워 넣습니다.
    pub fn set_definition(
        &mut self,
        plugin_id: impl Into<String>,
        mut definition: PluginDefinition,
    ) {
        let plugin_id = plugin_id.into();
        definition.set_if_absent(ID_KEY, plugin_id.clone());
        debug!("[{}] Static definition set: {}", self.plugin_type, plugin_id);
        self.definitions.insert(plugin_id, definition);
    }

    /// 빌더 스타일 등록
    pub fn with_definition(
        mut self,
        plugin_id: impl Into<String>,
        definition: PluginDefinition,
    ) -> Self {
        self.set_definition(plugin_id, definition);
        self
    }

    /// 정의 삭제
    pub fn delete_definition(&mut self, plugin_id: &str) -> Option<PluginDefinition> {
        debug!("[{}] Static definition deleted: {}", self.plugin_type, plugin_id);
        self.definitions.remove(plugin_id)
    }

    /// 모든 정의 삭제
    pub fn clear(&mut self) {
        self.definitions = DefinitionStore::new();
    }
}

impl Discovery for StaticDiscovery {
    fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        Ok(self.definitions.clone())
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        match self.definitions.get(plugin_id) {
            Some(definition) => Ok(Some(definition.clone())),
            None => not_found_or_none(plugin_id, &self.plugin_type, exception_on_invalid),
        }
    }
}
