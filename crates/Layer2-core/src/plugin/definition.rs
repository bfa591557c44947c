//! Plugin Definition - 플러그인 메타데이터 레코드와 정의 저장소

use indexmap::IndexMap;
use plexus_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// 잘 알려진 키
// ============================================================================

/// 플러그인 ID (필수)
pub const ID_KEY: &str = "id";
/// 인스턴스화할 클래스 이름
pub const CLASS_KEY: &str = "class";
/// 정의를 소유한 모듈/확장
pub const PROVIDER_KEY: &str = "provider";
/// 파생 정의를 만드는 Deriver ID
pub const DERIVER_KEY: &str = "deriver";
/// 파생 정의의 기반 플러그인 ID
pub const BASE_PLUGIN_ID_KEY: &str = "base_plugin_id";
/// 파생 정의의 접미사 ID
pub const DERIVATIVE_ID_KEY: &str = "derivative_id";

/// 기반 ID와 파생 ID 사이 구분자
pub const DERIVATIVE_SEPARATOR: char = ':';

/// 런타임 설정 (인스턴스 생성 시 전달)
pub type Configuration = Map<String, Value>;

// ============================================================================
// 파생 ID 유틸리티
// ============================================================================

/// `base:derivative` 형식의 ID 생성
pub fn encode_derivative_id(base_plugin_id: &str, derivative_id: &str) -> String {
    format!("{}{}{}", base_plugin_id, DERIVATIVE_SEPARATOR, derivative_id)
}

/// 첫 번째 구분자에서 분리 (`"a:b:c"` → `("a", Some("b:c"))`)
pub fn split_derivative_id(plugin_id: &str) -> (&str, Option<&str>) {
    match plugin_id.split_once(DERIVATIVE_SEPARATOR) {
        Some((base, derivative)) => (base, Some(derivative)),
        None => (plugin_id, None),
    }
}

// ============================================================================
// PluginDefinition
// ============================================================================

/// 플러그인 정의 - 문자열 키 → 임의 값
///
/// 키 순서는 생성/파싱 순서를 유지합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginDefinition(Map<String, Value>);

impl PluginDefinition {
    /// ID만 가진 정의 생성
    pub fn new(id: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(ID_KEY.to_string(), Value::String(id.into()));
        Self(map)
    }

    /// 맵에서 생성
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// JSON 값에서 생성 (객체만 허용)
    pub fn from_value(plugin_id: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::invalid_definition(
                plugin_id,
                format!("expected a mapping, found {}", value_kind(&other)),
            )),
        }
    }

    // ========================================================================
    // 잘 알려진 키 접근
    // ========================================================================

    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_KEY)
    }

    pub fn class(&self) -> Option<&str> {
        self.get_str(CLASS_KEY)
    }

    pub fn provider(&self) -> Option<&str> {
        self.get_str(PROVIDER_KEY)
    }

    pub fn deriver(&self) -> Option<&str> {
        self.get_str(DERIVER_KEY)
    }

    pub fn base_plugin_id(&self) -> Option<&str> {
        self.get_str(BASE_PLUGIN_ID_KEY)
    }

    pub fn derivative_id(&self) -> Option<&str> {
        self.get_str(DERIVATIVE_ID_KEY)
    }

    /// 파생 정의인지
    pub fn is_derivative(&self) -> bool {
        self.contains_key(BASE_PLUGIN_ID_KEY)
    }

    // ========================================================================
    // 일반 접근
    // ========================================================================

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// 값 설정 (기존 값 반환)
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// 값이 없을 때만 설정
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<Value>) {
        if !self.0.contains_key(key) {
            self.0.insert(key.to_string(), value.into());
        }
    }

    /// 빌더 스타일 설정
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    // ========================================================================
    // 병합
    // ========================================================================

    /// 기본값 병합 - 정의 쪽 값이 우선, 중첩 객체는 재귀 병합
    pub fn merge_defaults(&mut self, defaults: &Map<String, Value>) {
        merge_maps(&mut self.0, defaults, false);
    }

    /// 깊은 병합 - `over` 쪽 값이 우선, 중첩 객체는 재귀 병합, 배열은 교체
    pub fn deep_merge(&mut self, over: &Map<String, Value>) {
        merge_maps(&mut self.0, over, true);
    }
}

impl From<Map<String, Value>> for PluginDefinition {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn merge_maps(target: &mut Map<String, Value>, other: &Map<String, Value>, other_wins: bool) {
    for (key, other_value) in other {
        match target.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && other_value.is_object() {
                    if let (Some(target_obj), Some(other_obj)) =
                        (existing.as_object_mut(), other_value.as_object())
                    {
                        merge_maps(target_obj, other_obj, other_wins);
                    }
                } else if other_wins {
                    *existing = other_value.clone();
                }
            }
            None => {
                target.insert(key.clone(), other_value.clone());
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

// ============================================================================
// DefinitionStore
// ============================================================================

/// 정의 저장소 - 플러그인 ID → 정의
///
/// 디스커버리가 만든 열거 순서를 유지합니다. 동등 비교는 순서와 무관합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionStore(IndexMap<String, PluginDefinition>);

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정의 추가 (같은 ID는 교체하되 위치 유지)
    pub fn insert(
        &mut self,
        plugin_id: impl Into<String>,
        definition: PluginDefinition,
    ) -> Option<PluginDefinition> {
        self.0.insert(plugin_id.into(), definition)
    }

    pub fn get(&self, plugin_id: &str) -> Option<&PluginDefinition> {
        self.0.get(plugin_id)
    }

    pub fn get_mut(&mut self, plugin_id: &str) -> Option<&mut PluginDefinition> {
        self.0.get_mut(plugin_id)
    }

    /// 정의 제거 (나머지 순서 유지)
    pub fn remove(&mut self, plugin_id: &str) -> Option<PluginDefinition> {
        self.0.shift_remove(plugin_id)
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.0.contains_key(plugin_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PluginDefinition)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut PluginDefinition)> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut PluginDefinition) -> bool,
    {
        self.0.retain(|id, def| keep(id, def));
    }

    /// 캐시 저장용 JSON 값
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// 캐시에서 복원
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl IntoIterator for DefinitionStore {
    type Item = (String, PluginDefinition);
    type IntoIter = indexmap::map::IntoIter<String, PluginDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, PluginDefinition)> for DefinitionStore {
    fn from_iter<I: IntoIterator<Item = (String, PluginDefinition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, PluginDefinition)> for DefinitionStore {
    fn extend<I: IntoIterator<Item = (String, PluginDefinition)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
