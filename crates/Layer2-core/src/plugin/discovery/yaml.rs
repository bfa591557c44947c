//! YAML Discovery - `{provider}.{name}.yml` 파일 패턴 디스커버리
//!
//! 각 (provider, directory) 쌍마다 고정된 이름의 파일 하나를 확인합니다.
//! 파일이 없으면 그 provider는 아무 정의도 기여하지 않습니다.

use super::{not_found_or_none, Discovery};
use crate::plugin::definition::{DefinitionStore, PluginDefinition, ID_KEY, PROVIDER_KEY};
use indexmap::IndexMap;
use plexus_foundation::{DiscoverySettings, Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 파일 내용이 정의로 매핑되는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YamlLayout {
    /// 파일 전체가 하나의 정의, ID는 provider 이름
    #[default]
    PerProvider,
    /// 최상위 키 하나가 플러그인 하나
    PerPlugin,
}

/// 파일 패턴 디스커버리
#[derive(Debug, Clone)]
pub struct YamlDiscovery {
    /// 파일명의 `{name}` 부분이자 플러그인 타입 이름
    name: String,

    /// provider → 검색 디렉토리 (등록 순서 유지)
    directories: IndexMap<String, PathBuf>,

    /// 파일 확장자
    extension: String,

    layout: YamlLayout,

    /// 일괄 디스커버리에서 잘못된 파일을 만나면 중단
    strict: bool,
}

impl YamlDiscovery {
    /// 새 디스커버리 생성
    pub fn new<I, P, D>(name: impl Into<String>, directories: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: Into<PathBuf>,
    {
        Self {
            name: name.into(),
            directories: directories
                .into_iter()
                .map(|(p, d)| (p.into(), d.into()))
                .collect(),
            extension: "yml".to_string(),
            layout: YamlLayout::PerProvider,
            strict: false,
        }
    }

    /// 디스커버리 설정 적용 (확장자, strict)
    pub fn with_settings(mut self, settings: &DiscoverySettings) -> Self {
        self.extension = settings.file_extension.clone();
        self.strict = settings.strict;
        self
    }

    /// 최상위 키마다 플러그인 하나로 해석
    pub fn keyed_by_plugin(mut self) -> Self {
        self.layout = YamlLayout::PerPlugin;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// provider 디렉토리 추가
    pub fn add_directory(&mut self, provider: impl Into<String>, directory: impl Into<PathBuf>) {
        self.directories.insert(provider.into(), directory.into());
    }

    pub fn layout(&self) -> YamlLayout {
        self.layout
    }

    /// provider의 파일 경로
    pub fn file_path(&self, provider: &str, directory: &Path) -> PathBuf {
        directory.join(format!("{}.{}.{}", provider, self.name, self.extension))
    }

    // ========================================================================
    // 원본 문서 접근
    // ========================================================================

    /// provider → 파싱된 문서 (파일이 있는 provider만)
    pub fn find_all(&self) -> Result<IndexMap<String, Value>> {
        let mut documents = IndexMap::new();

        for (provider, directory) in &self.directories {
            match self.read_document(provider, directory) {
                Ok(Some(document)) => {
                    documents.insert(provider.clone(), document);
                }
                Ok(None) => {}
                Err(e) if !self.strict => {
                    warn!("[{}] Skipping provider '{}': {}", self.name, provider, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(documents)
    }

    fn read_document(&self, provider: &str, directory: &Path) -> Result<Option<Value>> {
        let path = self.file_path(provider, directory);
        if !path.is_file() {
            return Ok(None);
        }

        debug!("[{}] Reading {}", self.name, path.display());
        let content = std::fs::read_to_string(&path)?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| {
            Error::invalid_definition(provider, format!("{}: {}", path.display(), e))
        })?;
        Ok(Some(document))
    }

    // ========================================================================
    // 문서 → 정의
    // ========================================================================

    fn provider_definition(&self, provider: &str, document: Value) -> Result<PluginDefinition> {
        let mut definition = PluginDefinition::from_value(provider, document)?;
        definition.set_if_absent(ID_KEY, provider);
        definition.set_if_absent(PROVIDER_KEY, provider);
        Ok(definition)
    }

    fn plugin_definitions(
        &self,
        provider: &str,
        document: Value,
    ) -> Result<Vec<(String, PluginDefinition)>> {
        let entries = match document {
            Value::Object(entries) => entries,
            Value::Null => return Ok(Vec::new()),
            _ => {
                return Err(Error::invalid_definition(
                    provider,
                    "top level of a plugin-keyed file must be a mapping",
                ))
            }
        };

        let mut definitions = Vec::with_capacity(entries.len());
        for (plugin_id, value) in entries {
            let mut definition = PluginDefinition::from_value(&plugin_id, value)?;
            definition.set(ID_KEY, plugin_id.clone());
            definition.set_if_absent(PROVIDER_KEY, provider);
            definitions.push((plugin_id, definition));
        }
        Ok(definitions)
    }

    fn collect(&self, provider: &str, document: Value, store: &mut DefinitionStore) -> Result<()> {
        match self.layout {
            YamlLayout::PerProvider => {
                let definition = self.provider_definition(provider, document)?;
                store.insert(provider, definition);
            }
            YamlLayout::PerPlugin => {
                for (plugin_id, definition) in self.plugin_definitions(provider, document)? {
                    if store.contains(&plugin_id) {
                        warn!(
                            "[{}] Plugin '{}' from provider '{}' overrides an earlier definition",
                            self.name, plugin_id, provider
                        );
                    }
                    store.insert(plugin_id, definition);
                }
            }
        }
        Ok(())
    }
}

impl Discovery for YamlDiscovery {
    fn plugin_type(&self) -> &str {
        &self.name
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut store = DefinitionStore::new();

        for (provider, document) in self.find_all()? {
            if let Err(e) = self.collect(&provider, document, &mut store) {
                if self.strict {
                    return Err(e);
                }
                warn!("[{}] Skipping provider '{}': {}", self.name, provider, e);
            }
        }

        info!("[{}] Discovered {} definitions", self.name, store.len());
        Ok(store)
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        if self.layout == YamlLayout::PerPlugin {
            let mut definitions = self.definitions()?;
            return match definitions.remove(plugin_id) {
                Some(definition) => Ok(Some(definition)),
                None => not_found_or_none(plugin_id, &self.name, exception_on_invalid),
            };
        }

        // 파일 하나만 확인
        let found = match self.directories.get(plugin_id) {
            Some(directory) => self.read_document(plugin_id, directory)?,
            None => None,
        };

        match found {
            Some(document) => self.provider_definition(plugin_id, document).map(Some),
            None => not_found_or_none(plugin_id, &self.name, exception_on_invalid),
        }
    }
}
