//! Process Discovery - 모든 정의에 가공 함수를 적용
//!
//! 일괄 조회에서는 실패한 정의만 빠지고, 단일 조회에서는 에러가 그대로 전달됩니다.

use crate::plugin::definition::{DefinitionStore, PluginDefinition};
use crate::plugin::discovery::Discovery;
use plexus_foundation::Result;
use tracing::warn;

/// 가공 함수 (정의, 플러그인 ID)
pub type ProcessFn = Box<dyn Fn(&mut PluginDefinition, &str) -> Result<()> + Send + Sync>;

/// 가공 데코레이터
pub struct ProcessDiscovery<D> {
    inner: D,
    process: ProcessFn,
}

impl<D: Discovery> ProcessDiscovery<D> {
    pub fn new<F>(inner: D, process: F) -> Self
    where
        F: Fn(&mut PluginDefinition, &str) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            inner,
            process: Box::new(process),
        }
    }
}

impl<D: Discovery> Discovery for ProcessDiscovery<D> {
    fn plugin_type(&self) -> &str {
        self.inner.plugin_type()
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut definitions = self.inner.definitions()?;
        definitions.retain(|plugin_id, definition| match (self.process)(definition, plugin_id) {
            Ok(()) => true,
            Err(e) => {
                warn!("[{}] Dropping '{}': {}", self.inner.plugin_type(), plugin_id, e);
                false
            }
        });
        Ok(definitions)
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        match self.inner.definition(plugin_id, exception_on_invalid)? {
            Some(mut definition) => {
                (self.process)(&mut definition, plugin_id)?;
                Ok(Some(definition))
            }
            None => Ok(None),
        }
    }

    fn clear_cached_definitions(&self) {
        self.inner.clear_cached_definitions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::discovery::StaticDiscovery;
    use plexus_foundation::Error;
    use serde_json::json;

    fn discovery() -> ProcessDiscovery<StaticDiscovery> {
        let raw = StaticDiscovery::new("block")
            .with_definition("good", PluginDefinition::default().with("weight", 1))
            .with_definition("bad", PluginDefinition::default().with("weight", "heavy"));

        ProcessDiscovery::new(raw, |definition: &mut PluginDefinition, plugin_id: &str| {
            if !definition.get("weight").is_some_and(|w| w.is_number()) {
                return Err(Error::invalid_definition(plugin_id, "weight must be a number"));
            }
            definition.set("processed", true);
            Ok(())
        })
    }

    #[test]
    fn test_bulk_drops_failures() {
        let definitions = discovery().definitions().unwrap();
        assert_eq!(definitions.ids().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(definitions.get("good").unwrap().get("processed"), Some(&json!(true)));
    }

    #[test]
    fn test_single_lookup_propagates() {
        let discovery = discovery();
        assert!(discovery.definition("good", true).unwrap().is_some());

        let err = discovery.definition("bad", true).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
        assert!(discovery.definition("missing", false).unwrap().is_none());
    }
}
