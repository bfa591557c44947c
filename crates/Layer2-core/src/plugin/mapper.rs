//! Instance Mapper - 임의의 옵션을 플러그인 ID로 매핑

use super::definition::DefinitionStore;
use serde_json::Value;
use std::path::Path;

/// 옵션 → 플러그인 ID
pub trait InstanceMapper: Send + Sync {
    /// 일치하는 플러그인이 없으면 `None`
    fn plugin_id(&self, options: &Value, definitions: &DefinitionStore) -> Option<String>;
}

/// `options["filepath"]`의 확장자를 정의의 `extensions` 목록과 대조
///
/// 열거 순서상 처음 일치하는 정의를 고릅니다. 대소문자는 구분하지 않습니다.
#[derive(Debug, Clone)]
pub struct ExtensionMapper {
    option_key: String,
    definition_key: String,
}

impl ExtensionMapper {
    pub fn new() -> Self {
        Self {
            option_key: "filepath".to_string(),
            definition_key: "extensions".to_string(),
        }
    }

    pub fn with_keys(option_key: impl Into<String>, definition_key: impl Into<String>) -> Self {
        Self {
            option_key: option_key.into(),
            definition_key: definition_key.into(),
        }
    }
}

impl Default for ExtensionMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceMapper for ExtensionMapper {
    fn plugin_id(&self, options: &Value, definitions: &DefinitionStore) -> Option<String> {
        let filepath = options.get(&self.option_key)?.as_str()?;
        let extension = Path::new(filepath).extension()?.to_str()?.to_lowercase();

        definitions
            .iter()
            .find(|(_, definition)| {
                definition
                    .get(&self.definition_key)
                    .and_then(Value::as_array)
                    .is_some_and(|extensions| {
                        extensions
                            .iter()
                            .filter_map(Value::as_str)
                            .any(|candidate| candidate.eq_ignore_ascii_case(&extension))
                    })
            })
            .map(|(plugin_id, _)| plugin_id.clone())
    }
}
