//! Static Merge Discovery - 내부 결과에 코드로 등록한 정의를 병합

use crate::plugin::definition::DefinitionStore;
use crate::plugin::discovery::Discovery;
use plexus_foundation::Result;

/// 등록 콜백: 정의를 추가하거나 기존 ID를 덮어씀
pub type RegisterFn = Box<dyn Fn(&mut DefinitionStore) -> Result<()> + Send + Sync>;

/// 정적 병합 데코레이터
pub struct StaticMergeDiscovery<D> {
    inner: D,
    register: RegisterFn,
}

impl<D: Discovery> StaticMergeDiscovery<D> {
    pub fn new<F>(inner: D, register: F) -> Self
    where
        F: Fn(&mut DefinitionStore) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            inner,
            register: Box::new(register),
        }
    }
}

impl<D: Discovery> Discovery for StaticMergeDiscovery<D> {
    fn plugin_type(&self) -> &str {
        self.inner.plugin_type()
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut definitions = self.inner.definitions()?;
        (self.register)(&mut definitions)?;
        Ok(definitions)
    }

    fn clear_cached_definitions(&self) {
        self.inner.clear_cached_definitions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::definition::PluginDefinition;
    use crate::plugin::discovery::StaticDiscovery;
    use serde_json::json;

    #[test]
    fn test_register_adds_and_overrides() {
        let raw = StaticDiscovery::new("block")
            .with_definition("a", PluginDefinition::default().with("weight", 1));

        let merged = StaticMergeDiscovery::new(raw, |definitions: &mut DefinitionStore| {
            definitions.insert("a", PluginDefinition::new("a").with("weight", 10));
            definitions.insert("extra", PluginDefinition::new("extra"));
            Ok(())
        });

        let definitions = merged.definitions().unwrap();
        assert_eq!(definitions.ids().collect::<Vec<_>>(), vec!["a", "extra"]);
        assert_eq!(definitions.get("a").unwrap().get("weight"), Some(&json!(10)));
        assert!(merged.has_definition("extra"));
    }

    #[test]
    fn test_register_error_propagates() {
        let merged =
            StaticMergeDiscovery::new(StaticDiscovery::new("block"), |_: &mut DefinitionStore| {
                Err("registration failed".into())
            });
        assert!(merged.definitions().is_err());
    }
}
