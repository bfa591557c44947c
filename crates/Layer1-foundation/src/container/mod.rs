//! Service Container - 의존성 주입 컨테이너
//!
//! 플러그인이 "컨테이너 인식 생성"을 선택했을 때 팩토리가 넘겨주는
//! 서비스 저장소입니다. 서비스는 문자열 ID로 식별됩니다.
//!
//! - `set`: 완성된 서비스 등록
//! - `register_factory`: 최초 `get` 시 한 번만 생성되는 지연 싱글톤

use crate::{Error, Result};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 컨테이너에 저장되는 서비스
pub type Service = Arc<dyn Any + Send + Sync>;

/// 지연 서비스 생성 함수
pub type ServiceFactoryFn = Arc<dyn Fn(&ServiceContainer) -> Result<Service> + Send + Sync>;

/// 서비스 컨테이너
#[derive(Default)]
pub struct ServiceContainer {
    /// 생성 완료된 서비스 (ID -> 서비스)
    services: RwLock<HashMap<String, Service>>,

    /// 지연 생성 팩토리 (ID -> 팩토리)
    factories: RwLock<HashMap<String, ServiceFactoryFn>>,
}

impl ServiceContainer {
    /// 빈 컨테이너 생성
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 서비스 등록 (같은 ID는 교체)
    pub fn set<T: Any + Send + Sync>(&self, id: impl Into<String>, service: Arc<T>) {
        let id = id.into();
        debug!("Registered service: {}", id);
        self.services.write().insert(id, service);
    }

    /// 지연 싱글톤 팩토리 등록
    pub fn register_factory<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&ServiceContainer) -> Result<Service> + Send + Sync + 'static,
    {
        let id = id.into();
        self.services.write().remove(&id);
        self.factories.write().insert(id, Arc::new(factory));
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 서비스 조회
    pub fn get(&self, id: &str) -> Result<Service> {
        if let Some(service) = self.services.read().get(id) {
            return Ok(Arc::clone(service));
        }

        // 잠금을 풀고 생성해야 팩토리가 다른 서비스를 조회할 수 있음
        let factory = self
            .factories
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(id.to_string()))?;

        let service = factory(self)?;
        debug!("Instantiated service: {}", id);

        // 경쟁 시 먼저 저장된 인스턴스를 유지
        let mut services = self.services.write();
        let stored = services
            .entry(id.to_string())
            .or_insert_with(|| Arc::clone(&service));
        Ok(Arc::clone(stored))
    }

    /// 타입이 지정된 서비스 조회
    pub fn get_typed<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?.downcast::<T>().map_err(|_| {
            Error::ServiceType(format!(
                "service '{}' is not a {}",
                id,
                std::any::type_name::<T>()
            ))
        })
    }

    /// 서비스 존재 여부 (등록 또는 팩토리)
    pub fn has(&self, id: &str) -> bool {
        self.services.read().contains_key(id) || self.factories.read().contains_key(id)
    }

    /// 등록된 서비스 ID 목록 (정렬됨)
    pub fn service_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.services.read().keys().cloned().collect();
        for id in self.factories.read().keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        ids
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.service_ids())
            .finish()
    }
}
