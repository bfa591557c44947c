//! Plexus Config - 통합 설정
//!
//! 캐시 백엔드와 디스커버리 동작을 제어합니다. 글로벌 설정 위에
//! 프로젝트 설정이 병합됩니다 (프로젝트 우선).

use super::store::{load_file, ConfigStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 설정 파일명
pub const PLEXUS_CONFIG_FILE: &str = "plexus.toml";

// ============================================================================
// Plexus Config (통합)
// ============================================================================

/// Plexus 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlexusConfig {
    /// 정의 캐시 설정
    #[serde(default)]
    pub cache: CacheSettings,

    /// 디스커버리 설정
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

impl PlexusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut layers = Vec::with_capacity(2);
        if let Ok(global) = ConfigStore::global() {
            layers.push(global);
        }
        layers.push(ConfigStore::project(project_root));

        Self::load_layers(&layers)
    }

    /// 저장소 순서대로 병합 (뒤쪽 우선)
    ///
    /// 각 파일에 실제로 적힌 키만 앞선 값을 덮어씁니다.
    pub fn load_layers(layers: &[ConfigStore]) -> Result<Self> {
        let mut config = Self::new();
        for store in layers {
            if let Some(overrides) =
                store.load_optional::<PlexusConfigOverrides>(PLEXUS_CONFIG_FILE)?
            {
                config.merge(overrides);
            }
        }
        Ok(config)
    }

    /// 특정 파일에서 로드 (.toml 또는 .json)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_file(path)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 덮어쓰기 병합 (`Some`인 값만 적용)
    pub fn merge(&mut self, overrides: impl Into<PlexusConfigOverrides>) {
        let overrides = overrides.into();
        self.cache.merge(overrides.cache);
        self.discovery.merge(overrides.discovery);
    }
}

// ============================================================================
// Overrides (파일에 적힌 키만)
// ============================================================================

/// 설정 파일 한 장의 내용 - 빠진 키는 `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexusConfigOverrides {
    pub cache: CacheOverrides,
    pub discovery: DiscoveryOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_subdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

/// 완성된 설정은 모든 키를 덮어씀
impl From<PlexusConfig> for PlexusConfigOverrides {
    fn from(config: PlexusConfig) -> Self {
        Self {
            cache: CacheOverrides {
                enabled: Some(config.cache.enabled),
                max_entries: Some(config.cache.max_entries),
                key_prefix: Some(config.cache.key_prefix),
                default_tags: Some(config.cache.default_tags),
            },
            discovery: DiscoveryOverrides {
                strict: Some(config.discovery.strict),
                plugin_subdir: Some(config.discovery.plugin_subdir),
                file_extension: Some(config.discovery.file_extension),
            },
        }
    }
}

// ============================================================================
// Cache Settings
// ============================================================================

/// 정의 캐시 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// 캐시 사용 여부
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 메모리 백엔드 최대 키 수
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// 캐시 키 접두사
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// 모든 정의 캐시 항목에 붙는 태그
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            key_prefix: default_key_prefix(),
            default_tags: default_tags(),
        }
    }
}

impl CacheSettings {
    fn merge(&mut self, overrides: CacheOverrides) {
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(max_entries) = overrides.max_entries {
            self.max_entries = max_entries;
        }
        if let Some(key_prefix) = overrides.key_prefix {
            self.key_prefix = key_prefix;
        }
        if let Some(tags) = overrides.default_tags {
            self.default_tags = tags;
        }
    }
}

// ============================================================================
// Discovery Settings
// ============================================================================

/// 디스커버리 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    /// 잘못된 메타데이터 블록을 만나면 전체 디스커버리를 중단
    #[serde(default)]
    pub strict: bool,

    /// 어노테이션 클래스 탐색 하위 디렉토리
    #[serde(default = "default_plugin_subdir")]
    pub plugin_subdir: String,

    /// 파일 패턴 디스커버리 확장자
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            strict: false,
            plugin_subdir: default_plugin_subdir(),
            file_extension: default_file_extension(),
        }
    }
}

impl DiscoverySettings {
    fn merge(&mut self, overrides: DiscoveryOverrides) {
        if let Some(strict) = overrides.strict {
            self.strict = strict;
        }
        if let Some(plugin_subdir) = overrides.plugin_subdir {
            self.plugin_subdir = plugin_subdir;
        }
        if let Some(file_extension) = overrides.file_extension {
            self.file_extension = file_extension;
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    crate::cache::DEFAULT_MAX_ENTRIES
}

fn default_key_prefix() -> String {
    "plugin_definitions:".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["plugin_definitions".to_string()]
}

fn default_plugin_subdir() -> String {
    "Plugin".to_string()
}

fn default_file_extension() -> String {
    "yml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlexusConfig::new();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.key_prefix, "plugin_definitions:");
        assert_eq!(config.discovery.plugin_subdir, "Plugin");
        assert_eq!(config.discovery.file_extension, "yml");
        assert!(!config.discovery.strict);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PlexusConfig = toml::from_str(
            r#"
            [discovery]
            strict = true
            "#,
        )
        .unwrap();

        assert!(config.discovery.strict);
        assert_eq!(config.discovery.file_extension, "yml");
        assert_eq!(config.cache, CacheSettings::default());
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = PlexusConfig::new();
        let mut other = PlexusConfig::new();
        other.cache.enabled = false;
        other.cache.key_prefix = "custom:".into();
        other.discovery.file_extension = "yaml".into();

        base.merge(other);

        assert!(!base.cache.enabled);
        assert_eq!(base.cache.key_prefix, "custom:");
        assert_eq!(base.discovery.file_extension, "yaml");
        assert_eq!(base.discovery.plugin_subdir, "Plugin");
    }

    #[test]
    fn test_load_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let plexus_dir = dir.path().join(".plexus");
        std::fs::create_dir_all(&plexus_dir).unwrap();
        std::fs::write(
            plexus_dir.join(PLEXUS_CONFIG_FILE),
            "[cache]\nmax_entries = 8\n",
        )
        .unwrap();

        let config = PlexusConfig::load(dir.path()).unwrap();
        assert_eq!(config.cache.max_entries, 8);
    }

    #[test]
    fn test_layers_keep_keys_the_later_file_omits() {
        let global = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            global.path().join(PLEXUS_CONFIG_FILE),
            "[cache]\nenabled = false\nkey_prefix = \"site:\"\n\n[discovery]\nstrict = true\n",
        )
        .unwrap();
        std::fs::write(
            project.path().join(PLEXUS_CONFIG_FILE),
            "[cache]\nmax_entries = 8\n",
        )
        .unwrap();

        let layers = [ConfigStore::new(global.path()), ConfigStore::new(project.path())];
        let config = PlexusConfig::load_layers(&layers).unwrap();

        assert!(!config.cache.enabled);
        assert!(config.discovery.strict);
        assert_eq!(config.cache.max_entries, 8);
        assert_eq!(config.cache.key_prefix, "site:");
    }

    #[test]
    fn test_later_layer_can_restore_default() {
        let global = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        std::fs::write(
            global.path().join(PLEXUS_CONFIG_FILE),
            "[discovery]\nfile_extension = \"yaml\"\n",
        )
        .unwrap();
        std::fs::write(
            project.path().join(PLEXUS_CONFIG_FILE),
            "[discovery]\nfile_extension = \"yml\"\n",
        )
        .unwrap();

        let layers = [ConfigStore::new(global.path()), ConfigStore::new(project.path())];
        let config = PlexusConfig::load_layers(&layers).unwrap();
        assert_eq!(config.discovery.file_extension, "yml");
    }

    #[test]
    fn test_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plexus.json");
        std::fs::write(&path, r#"{"discovery": {"plugin_subdir": "Plugins"}}"#).unwrap();

        let config = PlexusConfig::load_from(&path).unwrap();
        assert_eq!(config.discovery.plugin_subdir, "Plugins");
    }
}
