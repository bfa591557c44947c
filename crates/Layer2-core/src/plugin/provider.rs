//! Providers - 정의를 제공한 확장(모듈)의 활성 여부

use super::definition::PluginDefinition;
use super::manager::DefinitionProcessor;
use parking_lot::RwLock;
use plexus_foundation::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// 항상 존재하는 것으로 보는 provider
pub const BUILTIN_PROVIDERS: &[&str] = &["core", "component"];

/// provider 존재 여부 조회
pub trait ProviderList: Send + Sync {
    fn provider_exists(&self, provider: &str) -> bool;
}

/// 활성화된 provider 집합
#[derive(Debug, Default)]
pub struct EnabledProviders {
    providers: RwLock<HashSet<String>>,
}

impl EnabledProviders {
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            providers: RwLock::new(providers.into_iter().map(Into::into).collect()),
        }
    }

    pub fn enable(&self, provider: impl Into<String>) {
        self.providers.write().insert(provider.into());
    }

    pub fn disable(&self, provider: &str) -> bool {
        self.providers.write().remove(provider)
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl ProviderList for EnabledProviders {
    fn provider_exists(&self, provider: &str) -> bool {
        self.providers.read().contains(provider)
    }
}

// ============================================================================
// ProviderFilter
// ============================================================================

/// 비활성 provider의 정의를 거부하는 가공기
///
/// `provider`가 없는 정의와 내장 provider는 통과합니다.
#[derive(Clone)]
pub struct ProviderFilter {
    providers: Arc<dyn ProviderList>,
}

impl ProviderFilter {
    pub fn new(providers: Arc<dyn ProviderList>) -> Self {
        Self { providers }
    }
}

impl DefinitionProcessor for ProviderFilter {
    fn process(&self, definition: &mut PluginDefinition, plugin_id: &str) -> Result<()> {
        match definition.provider() {
            Some(provider)
                if !BUILTIN_PROVIDERS.contains(&provider)
                    && !self.providers.provider_exists(provider) =>
            {
                Err(Error::invalid_definition(
                    plugin_id,
                    format!("provider '{}' is not enabled", provider),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for ProviderFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFilter").finish_non_exhaustive()
    }
}
