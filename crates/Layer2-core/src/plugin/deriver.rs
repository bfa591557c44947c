//! Plugin Deriver - 기본 정의 하나를 여러 파생 정의로 확장
//!
//! 파생기는 호출마다 기본 정의를 받으며 기본 ID는 알지 못합니다.
//! 계산 결과는 파생기 인스턴스 안에만 캐시됩니다 (`DerivativeCache`).

use super::definition::PluginDefinition;
use indexmap::IndexMap;
use parking_lot::Mutex;
use plexus_foundation::{Error, Result, ServiceContainer};
use std::collections::HashMap;
use std::sync::Arc;

/// 파생 정의 생성기
pub trait Deriver: Send + Sync {
    /// 파생 ID → 파생 정의 (기본 정의에 덮어쓸 필드)
    fn derivative_definitions(
        &self,
        base: &PluginDefinition,
    ) -> Result<IndexMap<String, PluginDefinition>>;

    /// 단일 파생 정의
    ///
    /// 기본 구현은 전체 집합에서 조회합니다.
    fn derivative_definition(
        &self,
        derivative_id: &str,
        base: &PluginDefinition,
    ) -> Result<Option<PluginDefinition>> {
        Ok(self.derivative_definitions(base)?.shift_remove(derivative_id))
    }
}

// ============================================================================
// DerivativeCache
// ============================================================================

/// 파생기 인스턴스 범위의 파생 정의 캐시
#[derive(Debug, Default)]
pub struct DerivativeCache {
    derivatives: Mutex<Option<IndexMap<String, PluginDefinition>>>,
}

impl DerivativeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 캐시된 전체 집합, 없으면 계산 후 저장
    pub fn get_or_compute<F>(&self, compute: F) -> Result<IndexMap<String, PluginDefinition>>
    where
        F: FnOnce() -> Result<IndexMap<String, PluginDefinition>>,
    {
        let mut guard = self.derivatives.lock();
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let computed = compute()?;
        *guard = Some(computed.clone());
        Ok(computed)
    }

    /// 단일 항목 조회 (필요하면 전체 계산)
    pub fn get<F>(&self, derivative_id: &str, compute: F) -> Result<Option<PluginDefinition>>
    where
        F: FnOnce() -> Result<IndexMap<String, PluginDefinition>>,
    {
        Ok(self.get_or_compute(compute)?.shift_remove(derivative_id))
    }

    pub fn is_populated(&self) -> bool {
        self.derivatives.lock().is_some()
    }

    pub fn reset(&self) {
        *self.derivatives.lock() = None;
    }
}

// ============================================================================
// FnDeriver
// ============================================================================

/// 클로저 기반 파생기 (결과는 인스턴스 안에 캐시)
pub struct FnDeriver<F> {
    derive: F,
    cache: DerivativeCache,
}

impl<F> FnDeriver<F>
where
    F: Fn(&PluginDefinition) -> Result<IndexMap<String, PluginDefinition>> + Send + Sync,
{
    pub fn new(derive: F) -> Self {
        Self {
            derive,
            cache: DerivativeCache::new(),
        }
    }
}

impl<F> Deriver for FnDeriver<F>
where
    F: Fn(&PluginDefinition) -> Result<IndexMap<String, PluginDefinition>> + Send + Sync,
{
    fn derivative_definitions(
        &self,
        base: &PluginDefinition,
    ) -> Result<IndexMap<String, PluginDefinition>> {
        self.cache.get_or_compute(|| (self.derive)(base))
    }

    fn derivative_definition(
        &self,
        derivative_id: &str,
        base: &PluginDefinition,
    ) -> Result<Option<PluginDefinition>> {
        self.cache.get(derivative_id, || (self.derive)(base))
    }
}

// ============================================================================
// DeriverRegistry
// ============================================================================

type PlainConstructor = Arc<dyn Fn() -> Arc<dyn Deriver> + Send + Sync>;
type ContainerConstructor =
    Arc<dyn Fn(&ServiceContainer) -> Result<Arc<dyn Deriver>> + Send + Sync>;

#[derive(Clone)]
enum DeriverConstructor {
    Plain(PlainConstructor),
    ContainerAware(ContainerConstructor),
}

/// 파생기 ID → 생성자
///
/// 정의의 `deriver` 값으로 파생기를 찾습니다. 컨테이너 인식 생성자는
/// 연결된 `ServiceContainer`에서 의존성을 가져옵니다.
#[derive(Clone, Default)]
pub struct DeriverRegistry {
    constructors: HashMap<String, DeriverConstructor>,
    container: Option<Arc<ServiceContainer>>,
}

impl DeriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컨테이너 연결
    pub fn with_container(mut self, container: Arc<ServiceContainer>) -> Self {
        self.container = Some(container);
        self
    }

    /// 일반 파생기 등록
    pub fn register<F>(&mut self, deriver_id: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn Deriver> + Send + Sync + 'static,
    {
        self.constructors.insert(
            deriver_id.into(),
            DeriverConstructor::Plain(Arc::new(constructor)),
        );
    }

    /// 컨테이너 인식 파생기 등록
    pub fn register_container_aware<F>(&mut self, deriver_id: impl Into<String>, constructor: F)
    where
        F: Fn(&ServiceContainer) -> Result<Arc<dyn Deriver>> + Send + Sync + 'static,
    {
        self.constructors.insert(
            deriver_id.into(),
            DeriverConstructor::ContainerAware(Arc::new(constructor)),
        );
    }

    pub fn contains(&self, deriver_id: &str) -> bool {
        self.constructors.contains_key(deriver_id)
    }

    /// 파생기 생성
    ///
    /// `base_plugin_id`는 에러 메시지에만 쓰입니다.
    pub fn create(&self, deriver_id: &str, base_plugin_id: &str) -> Result<Arc<dyn Deriver>> {
        let constructor = self.constructors.get(deriver_id).ok_or_else(|| {
            Error::invalid_definition(
                base_plugin_id,
                format!("deriver '{}' does not exist", deriver_id),
            )
        })?;

        match constructor {
            DeriverConstructor::Plain(construct) => Ok(construct()),
            DeriverConstructor::ContainerAware(construct) => {
                let container = self.container.as_deref().ok_or_else(|| {
                    Error::invalid_definition(
                        base_plugin_id,
                        format!("deriver '{}' requires a service container", deriver_id),
                    )
                })?;
                construct(container)
            }
        }
    }
}

impl std::fmt::Debug for DeriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.constructors.keys().collect();
        ids.sort();
        f.debug_struct("DeriverRegistry")
            .field("derivers", &ids)
            .field("has_container", &self.container.is_some())
            .finish()
    }
}
