//! Plugin Discovery - 정의 발견 프로토콜
//!
//! 모든 디스커버리(정적 등록, 파일 패턴, 어노테이션 클래스)와
//! 데코레이터(캐시, 파생, 정적 병합, 가공)는 이 trait 하나를 구현합니다.
//!
//! ```text
//! Manager ─▶ Process ─▶ StaticMerge ─▶ Derivative ─▶ Cached ─▶ (raw discovery)
//!            (outermost)                                      (innermost)
//! ```

mod annotated;
mod static_discovery;
mod yaml;

pub use annotated::{AnnotatedClassDiscovery, DiscoveryProblem, METADATA_FENCE};
pub use static_discovery::StaticDiscovery;
pub use yaml::{YamlDiscovery, YamlLayout};

use super::definition::{DefinitionStore, PluginDefinition};
use plexus_foundation::{Error, Result};

/// 정의 발견 프로토콜
pub trait Discovery: Send + Sync {
    /// 플러그인 타입 이름 (에러 메시지용)
    fn plugin_type(&self) -> &str;

    /// 모든 정의
    ///
    /// 외부 탐색 공간에 부작용이 없어야 하며, 같은 상태에서 반복 호출하면
    /// 같은 내용을 돌려줍니다.
    fn definitions(&self) -> Result<DefinitionStore>;

    /// 단일 정의
    ///
    /// 없는 ID: `exception_on_invalid`이면 `PluginNotFound`, 아니면 `Ok(None)`.
    /// 기본 구현은 전체 집합을 만든 뒤 조회합니다.
    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        let mut definitions = self.definitions()?;
        match definitions.remove(plugin_id) {
            Some(definition) => Ok(Some(definition)),
            None => not_found_or_none(plugin_id, self.plugin_type(), exception_on_invalid),
        }
    }

    /// 정의 존재 여부
    fn has_definition(&self, plugin_id: &str) -> bool {
        matches!(self.definition(plugin_id, false), Ok(Some(_)))
    }

    /// 캐시된 정의 제거
    ///
    /// 캐시를 가진 데코레이터만 의미가 있고 나머지는 내부로 위임합니다.
    /// 프레임워크 스스로는 호출하지 않습니다.
    fn clear_cached_definitions(&self) {}
}

impl<D: Discovery + ?Sized> Discovery for Box<D> {
    fn plugin_type(&self) -> &str {
        (**self).plugin_type()
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        (**self).definitions()
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        (**self).definition(plugin_id, exception_on_invalid)
    }

    fn has_definition(&self, plugin_id: &str) -> bool {
        (**self).has_definition(plugin_id)
    }

    fn clear_cached_definitions(&self) {
        (**self).clear_cached_definitions()
    }
}

/// 없는 ID 처리 헬퍼
pub fn not_found_or_none<T>(
    plugin_id: &str,
    plugin_type: &str,
    exception_on_invalid: bool,
) -> Result<Option<T>> {
    if exception_on_invalid {
        Err(Error::plugin_not_found(plugin_id, plugin_type))
    } else {
        Ok(None)
    }
}
