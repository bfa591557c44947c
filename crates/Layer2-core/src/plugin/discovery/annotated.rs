//! Annotated Class Discovery - 소스 파일 메타데이터 블록 디스커버리
//!
//! `{root}/{subdir}/{owner}/{type}/**/*.rs` 파일을 훑어 맨 앞의 `//!`
//! 메타데이터 블록을 읽습니다. 파일을 컴파일하거나 실행하지 않습니다.
//!
//! ```text
//! //! --- @Block
//! //! admin_label: Powered by Plexus
//! //! category: System
//! //! ---
//! ```

use super::Discovery;
use crate::plugin::definition::{
    DefinitionStore, PluginDefinition, CLASS_KEY, ID_KEY, PROVIDER_KEY,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use plexus_foundation::{DiscoverySettings, Error, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// 메타데이터 블록 경계
pub const METADATA_FENCE: &str = "//! ---";

const DOC_PREFIX: &str = "//!";

/// 건너뛴 파일 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryProblem {
    pub path: PathBuf,
    pub reason: String,
}

/// 파일 하나의 파싱 결과
#[derive(Debug, Clone)]
enum ParsedFile {
    Annotated(Map<String, Value>),
    NotCandidate,
    Malformed(String),
}

/// 어노테이션 클래스 디스커버리
pub struct AnnotatedClassDiscovery {
    plugin_type: String,

    /// 블록 시작 줄의 `@{annotation}`
    annotation: String,

    /// `{owner}/{type}` 상대 경로 (예: `Field/FieldFormatter`)
    plugin_dir: String,

    /// 모든 namespace 공통 하위 디렉토리
    subdir: String,

    /// namespace → 루트 디렉토리
    namespaces: IndexMap<String, PathBuf>,

    /// namespace별 추가 필드
    namespace_fields: HashMap<String, Map<String, Value>>,

    strict: bool,

    /// (path, mtime) 파싱 캐시
    parsed: Mutex<HashMap<PathBuf, (SystemTime, ParsedFile)>>,

    /// 마지막 스캔에서 건너뛴 파일
    problems: Mutex<Vec<DiscoveryProblem>>,
}

impl AnnotatedClassDiscovery {
    /// 새 디스커버리 생성
    ///
    /// `plugin_dir`은 `{owner}/{type}` 형태의 상대 경로입니다.
    pub fn new(
        plugin_type: impl Into<String>,
        annotation: impl Into<String>,
        plugin_dir: impl Into<String>,
    ) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            annotation: annotation.into(),
            plugin_dir: plugin_dir.into().trim_matches('/').to_string(),
            subdir: "Plugin".to_string(),
            namespaces: IndexMap::new(),
            namespace_fields: HashMap::new(),
            strict: false,
            parsed: Mutex::new(HashMap::new()),
            problems: Mutex::new(Vec::new()),
        }
    }

    /// 디스커버리 설정 적용 (하위 디렉토리, strict)
    pub fn with_settings(mut self, settings: &DiscoverySettings) -> Self {
        self.subdir = settings.plugin_subdir.clone();
        self.strict = settings.strict;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// namespace 루트 추가
    pub fn with_namespace(
        mut self,
        namespace: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        self.namespaces.insert(namespace.into(), root.into());
        self
    }

    /// namespace의 모든 정의에 병합할 필드
    pub fn with_namespace_fields(
        mut self,
        namespace: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        self.namespace_fields.insert(namespace.into(), fields);
        self
    }

    /// 마지막 스캔에서 건너뛴 파일들
    pub fn problems(&self) -> Vec<DiscoveryProblem> {
        self.problems.lock().clone()
    }

    // ========================================================================
    // 스캔
    // ========================================================================

    fn scan_root(&self, root: &Path) -> PathBuf {
        let mut dir = root.join(&self.subdir);
        for segment in self.plugin_dir.split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir
    }

    fn candidate_files(&self, namespace: &str, root: &Path) -> Vec<PathBuf> {
        let base = self.scan_root(root);
        if !base.is_dir() {
            return Vec::new();
        }

        let pattern = format!(
            "{}/**/*.rs",
            glob::Pattern::escape(&base.to_string_lossy())
        );
        debug!("[{}] Scanning {} ({})", self.plugin_type, base.display(), namespace);

        match glob::glob(&pattern) {
            Ok(paths) => {
                let mut files: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
                files.sort();
                files
            }
            Err(e) => {
                warn!("[{}] Invalid scan pattern {}: {}", self.plugin_type, pattern, e);
                Vec::new()
            }
        }
    }

    /// 파일 경로 → 클래스 이름
    fn class_name(&self, namespace: &str, root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.scan_root(root)).ok()?;
        let mut segments = vec![namespace.to_string(), self.subdir.clone()];
        segments.extend(
            self.plugin_dir
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );

        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                segments.push(component.as_os_str().to_string_lossy().into_owned());
            }
        }
        segments.push(path.file_stem()?.to_string_lossy().into_owned());

        Some(segments.join("::"))
    }

    fn parse_cached(&self, path: &Path) -> ParsedFile {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        if let Some(mtime) = modified {
            if let Some((cached_mtime, parsed)) = self.parsed.lock().get(path) {
                if *cached_mtime == mtime {
                    return parsed.clone();
                }
            }
        }

        let parsed = match std::fs::read_to_string(path) {
            Ok(content) => parse_metadata_block(&content, &self.annotation),
            Err(e) => ParsedFile::Malformed(e.to_string()),
        };

        if let Some(mtime) = modified {
            self.parsed
                .lock()
                .insert(path.to_path_buf(), (mtime, parsed.clone()));
        }
        parsed
    }

    fn build_definition(
        &self,
        namespace: &str,
        class: String,
        fields: Map<String, Value>,
    ) -> Result<PluginDefinition> {
        let mut definition = PluginDefinition::from_map(fields);
        let plugin_id = definition
            .id()
            .map(str::to_string)
            .ok_or_else(|| Error::invalid_definition(class.as_str(), "metadata block has no id"))?;

        definition.set(CLASS_KEY, class);
        definition.set_if_absent(PROVIDER_KEY, namespace);
        if let Some(extra) = self.namespace_fields.get(namespace) {
            definition.merge_defaults(extra);
        }
        definition.set(ID_KEY, plugin_id);
        Ok(definition)
    }
}

impl Discovery for AnnotatedClassDiscovery {
    fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut store = DefinitionStore::new();
        let mut problems = Vec::new();
        let mut scanned = HashSet::new();

        for (namespace, root) in &self.namespaces {
            for path in self.candidate_files(namespace, root) {
                scanned.insert(path.clone());
                let fields = match self.parse_cached(&path) {
                    ParsedFile::Annotated(fields) => fields,
                    ParsedFile::NotCandidate => continue,
                    ParsedFile::Malformed(reason) => {
                        if self.strict {
                            return Err(Error::invalid_definition(
                                path.display().to_string(),
                                reason,
                            ));
                        }
                        warn!("[{}] Skipping {}: {}", self.plugin_type, path.display(), reason);
                        problems.push(DiscoveryProblem { path, reason });
                        continue;
                    }
                };

                let Some(class) = self.class_name(namespace, root, &path) else {
                    continue;
                };

                match self.build_definition(namespace, class, fields) {
                    Ok(definition) => {
                        let plugin_id = definition.id().unwrap_or_default().to_string();
                        if let Some(previous) = store.get(&plugin_id) {
                            let reason = format!(
                                "plugin id '{}' replaces the definition from {}",
                                plugin_id,
                                previous.class().unwrap_or_default()
                            );
                            warn!("[{}] {}: {}", self.plugin_type, path.display(), reason);
                            problems.push(DiscoveryProblem { path, reason });
                        }
                        store.insert(plugin_id, definition);
                    }
                    Err(e) if !self.strict => {
                        warn!("[{}] Skipping {}: {}", self.plugin_type, path.display(), e);
                        problems.push(DiscoveryProblem {
                            path,
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        // 사라진 파일의 파싱 결과 제거
        self.parsed.lock().retain(|path, _| scanned.contains(path));

        info!(
            "[{}] Discovered {} annotated definitions ({} skipped)",
            self.plugin_type,
            store.len(),
            problems.len()
        );
        *self.problems.lock() = problems;
        Ok(store)
    }
}

impl std::fmt::Debug for AnnotatedClassDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatedClassDiscovery")
            .field("plugin_type", &self.plugin_type)
            .field("annotation", &self.annotation)
            .field("plugin_dir", &self.plugin_dir)
            .field("namespaces", &self.namespaces)
            .field("strict", &self.strict)
            .finish()
    }
}

// ============================================================================
// 메타데이터 블록 파서
// ============================================================================

/// 선행 `//!` 줄에서 `@{annotation}` 블록을 찾아 YAML로 파싱
fn parse_metadata_block(content: &str, annotation: &str) -> ParsedFile {
    let opening = format!("{} @{}", METADATA_FENCE, annotation);

    let doc_lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| line.starts_with(DOC_PREFIX))
        .collect();

    let Some(start) = doc_lines.iter().position(|line| *line == opening) else {
        return ParsedFile::NotCandidate;
    };

    let Some(length) = doc_lines[start + 1..]
        .iter()
        .position(|line| *line == METADATA_FENCE)
    else {
        return ParsedFile::Malformed(format!("unclosed @{} metadata block", annotation));
    };

    let yaml_content = doc_lines[start + 1..start + 1 + length]
        .iter()
        .map(|line| {
            let body = &line[DOC_PREFIX.len()..];
            body.strip_prefix(' ').unwrap_or(body)
        })
        .collect::<Vec<_>>()
        .join("\n");

    match serde_yaml::from_str::<Value>(&yaml_content) {
        Ok(Value::Object(fields)) => ParsedFile::Annotated(fields),
        Ok(Value::Null) => ParsedFile::Annotated(Map::new()),
        Ok(_) => ParsedFile::Malformed("metadata block must be a mapping".to_string()),
        Err(e) => ParsedFile::Malformed(format!("invalid metadata YAML: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const POWERED_BY: &str = "\
//! --- @Block
//! id: powered_by
//! admin_label: Powered by Plexus
//! settings:
//!   label_display: false
//! ---

pub struct PoweredByBlock;
";

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, AnnotatedClassDiscovery) {
        let root = tempfile::tempdir().unwrap();
        let system = root.path().join("system");
        write(&system, "Plugin/Block/Block/PoweredBy.rs", POWERED_BY);
        write(
            &system,
            "Plugin/Block/Block/Nested/Branding.rs",
            "//! Site branding\n//! --- @Block\n//! id: branding\n//! ---\n",
        );
        write(&system, "Plugin/Block/Block/helpers.rs", "pub fn helper() {}\n");
        write(
            &system,
            "Plugin/Block/Block/Other.rs",
            "//! --- @Archiver\n//! id: other\n//! ---\n",
        );

        let discovery = AnnotatedClassDiscovery::new("block", "Block", "Block/Block")
            .with_namespace("system", &system);
        (root, discovery)
    }

    #[test]
    fn test_parse_metadata_block() {
        match parse_metadata_block(POWERED_BY, "Block") {
            ParsedFile::Annotated(fields) => {
                assert_eq!(fields.get("id"), Some(&json!("powered_by")));
                assert_eq!(fields["settings"]["label_display"], json!(false));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            parse_metadata_block("pub struct Plain;\n", "Block"),
            ParsedFile::NotCandidate
        ));
        assert!(matches!(
            parse_metadata_block("//! --- @Block\n//! id: x\n", "Block"),
            ParsedFile::Malformed(_)
        ));
    }

    #[test]
    fn test_block_after_code_is_ignored() {
        let content = "pub struct Late;\n//! --- @Block\n//! id: late\n//! ---\n";
        assert!(matches!(
            parse_metadata_block(content, "Block"),
            ParsedFile::NotCandidate
        ));
    }

    #[test]
    fn test_discovers_annotated_files() {
        let (_root, discovery) = fixture();
        let definitions = discovery.definitions().unwrap();

        assert_eq!(
            definitions.ids().collect::<Vec<_>>(),
            vec!["branding", "powered_by"]
        );

        let powered = definitions.get("powered_by").unwrap();
        assert_eq!(powered.class(), Some("system::Plugin::Block::Block::PoweredBy"));
        assert_eq!(powered.provider(), Some("system"));
        assert_eq!(powered.get("admin_label"), Some(&json!("Powered by Plexus")));

        let branding = definitions.get("branding").unwrap();
        assert_eq!(
            branding.class(),
            Some("system::Plugin::Block::Block::Nested::Branding")
        );
        assert!(discovery.problems().is_empty());
    }

    #[test]
    fn test_malformed_block_is_reported() {
        let (root, discovery) = fixture();
        write(
            &root.path().join("system"),
            "Plugin/Block/Block/Broken.rs",
            "//! --- @Block\n//! id: [broken\n//! ---\n",
        );

        let definitions = discovery.definitions().unwrap();
        assert_eq!(definitions.len(), 2);

        let problems = discovery.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].path.ends_with("Broken.rs"));

        let strict = discovery.with_strict(true);
        let err = strict.definitions().unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn test_duplicate_id_is_reported() {
        let (root, discovery) = fixture();
        write(
            &root.path().join("system"),
            "Plugin/Block/Block/Zz/PoweredByAgain.rs",
            "//! --- @Block\n//! id: powered_by\n//! ---\n",
        );

        let definitions = discovery.definitions().unwrap();
        assert_eq!(definitions.len(), 2);
        assert_eq!(
            definitions.get("powered_by").unwrap().class(),
            Some("system::Plugin::Block::Block::Zz::PoweredByAgain")
        );

        let problems = discovery.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].path.ends_with("PoweredByAgain.rs"));
        assert!(problems[0].reason.contains("powered_by"));
    }

    #[test]
    fn test_parse_cache_drops_deleted_files() {
        let (root, discovery) = fixture();
        discovery.definitions().unwrap();
        assert_eq!(discovery.parsed.lock().len(), 4);

        std::fs::remove_file(root.path().join("system/Plugin/Block/Block/PoweredBy.rs")).unwrap();
        let definitions = discovery.definitions().unwrap();

        assert!(!definitions.contains("powered_by"));
        let parsed = discovery.parsed.lock();
        assert_eq!(parsed.len(), 3);
        assert!(parsed.keys().all(|path| !path.ends_with("PoweredBy.rs")));
    }

    #[test]
    fn test_namespace_fields_and_settings() {
        let root = tempfile::tempdir().unwrap();
        let contrib = root.path().join("contrib");
        write(
            &contrib,
            "Extension/Archiver/Archiver/Zip.rs",
            "//! --- @Archiver\n//! id: zip\n//! extensions: [zip]\n//! ---\n",
        );

        let settings = DiscoverySettings {
            plugin_subdir: "Extension".to_string(),
            ..Default::default()
        };
        let mut extra = Map::new();
        extra.insert("package".to_string(), json!("contrib"));
        extra.insert("extensions".to_string(), json!(["ignored"]));

        let discovery = AnnotatedClassDiscovery::new("archiver", "Archiver", "Archiver/Archiver")
            .with_settings(&settings)
            .with_namespace("contrib", &contrib)
            .with_namespace_fields("contrib", extra);

        let zip = discovery.definition("zip", true).unwrap().unwrap();
        assert_eq!(zip.class(), Some("contrib::Extension::Archiver::Archiver::Zip"));
        assert_eq!(zip.get("package"), Some(&json!("contrib")));
        assert_eq!(zip.get("extensions"), Some(&json!(["zip"])));
        assert!(discovery.definition("tar", true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_plugin_directory_contributes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let discovery = AnnotatedClassDiscovery::new("block", "Block", "Block/Block")
            .with_namespace("empty", root.path());
        assert!(discovery.definitions().unwrap().is_empty());
    }
}
