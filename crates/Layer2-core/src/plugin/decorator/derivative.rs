//! Derivative Discovery - `deriver`를 선언한 정의를 파생 정의로 확장
//!
//! 파생 정의 = 기본 정의 ⊕ 파생 필드 (파생 쪽 우선), ID는 `base:derivative`.
//! 파생이 하나도 없는 기본 정의는 결과에서 사라집니다.

use crate::plugin::definition::{
    encode_derivative_id, split_derivative_id, DefinitionStore, PluginDefinition,
    BASE_PLUGIN_ID_KEY, DERIVATIVE_ID_KEY, ID_KEY,
};
use crate::plugin::deriver::{Deriver, DeriverRegistry};
use crate::plugin::discovery::{not_found_or_none, Discovery};
use parking_lot::Mutex;
use plexus_foundation::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 파생 데코레이터
pub struct DerivativeDiscovery<D> {
    inner: D,
    registry: DeriverRegistry,

    /// 기본 ID → (생성 당시 기본 정의, 파생기)
    ///
    /// 기본 정의가 바뀌면 파생기를 새로 만듭니다.
    derivers: Mutex<HashMap<String, (PluginDefinition, Arc<dyn Deriver>)>>,
}

impl<D: Discovery> DerivativeDiscovery<D> {
    pub fn new(inner: D, registry: DeriverRegistry) -> Self {
        Self {
            inner,
            registry,
            derivers: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// 기본 정의의 파생기 (없으면 `None`)
    fn deriver_for(
        &self,
        base_plugin_id: &str,
        base: &PluginDefinition,
    ) -> Result<Option<Arc<dyn Deriver>>> {
        let Some(deriver_id) = base.deriver() else {
            return Ok(None);
        };

        if let Some((cached_base, deriver)) = self.derivers.lock().get(base_plugin_id) {
            if cached_base == base {
                return Ok(Some(deriver.clone()));
            }
        }

        debug!(
            "[{}] Creating deriver '{}' for '{}'",
            self.plugin_type(),
            deriver_id,
            base_plugin_id
        );
        let deriver = self.registry.create(deriver_id, base_plugin_id)?;
        self.derivers
            .lock()
            .insert(base_plugin_id.to_string(), (base.clone(), deriver.clone()));
        Ok(Some(deriver))
    }

    fn expand(
        &self,
        base_plugin_id: &str,
        base: &PluginDefinition,
        deriver: &dyn Deriver,
    ) -> Result<Vec<(String, PluginDefinition)>> {
        let derivatives = deriver.derivative_definitions(base)?;
        Ok(derivatives
            .into_iter()
            .map(|(derivative_id, derivative)| {
                let plugin_id = encode_derivative_id(base_plugin_id, &derivative_id);
                let definition =
                    build_derivative(base_plugin_id, base, &derivative_id, &derivative);
                (plugin_id, definition)
            })
            .collect())
    }

    fn single_derivative(
        &self,
        plugin_id: &str,
        base_plugin_id: &str,
        derivative_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        let base = match self.inner.definition(base_plugin_id, false)? {
            Some(base) if base.deriver().is_some() => base,
            // `a:b` 형태의 일반 ID일 수 있음
            _ => return self.plain_definition(plugin_id, exception_on_invalid),
        };

        let Some(deriver) = self.deriver_for(base_plugin_id, &base)? else {
            return not_found_or_none(plugin_id, self.plugin_type(), exception_on_invalid);
        };

        match deriver.derivative_definition(derivative_id, &base)? {
            Some(derivative) => Ok(Some(build_derivative(
                base_plugin_id,
                &base,
                derivative_id,
                &derivative,
            ))),
            None => not_found_or_none(plugin_id, self.plugin_type(), exception_on_invalid),
        }
    }

    /// 파생기가 없는 정의만 그대로 통과
    fn plain_definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        match self.inner.definition(plugin_id, exception_on_invalid)? {
            Some(definition) if definition.deriver().is_none() => Ok(Some(definition)),
            Some(_) => not_found_or_none(plugin_id, self.plugin_type(), exception_on_invalid),
            None => Ok(None),
        }
    }
}

fn build_derivative(
    base_plugin_id: &str,
    base: &PluginDefinition,
    derivative_id: &str,
    derivative: &PluginDefinition,
) -> PluginDefinition {
    let mut definition = base.clone();
    definition.deep_merge(derivative.as_map());
    definition.set(ID_KEY, encode_derivative_id(base_plugin_id, derivative_id));
    definition.set(BASE_PLUGIN_ID_KEY, base_plugin_id);
    definition.set(DERIVATIVE_ID_KEY, derivative_id);
    definition
}

impl<D: Discovery> Discovery for DerivativeDiscovery<D> {
    fn plugin_type(&self) -> &str {
        self.inner.plugin_type()
    }

    fn definitions(&self) -> Result<DefinitionStore> {
        let mut store = DefinitionStore::new();

        for (plugin_id, definition) in self.inner.definitions()? {
            let deriver = match self.deriver_for(&plugin_id, &definition) {
                Ok(Some(deriver)) => deriver,
                Ok(None) => {
                    store.insert(plugin_id, definition);
                    continue;
                }
                Err(e) => {
                    warn!("[{}] Dropping '{}': {}", self.plugin_type(), plugin_id, e);
                    continue;
                }
            };

            match self.expand(&plugin_id, &definition, deriver.as_ref()) {
                Ok(derivatives) => {
                    debug!(
                        "[{}] '{}' expanded into {} derivatives",
                        self.plugin_type(),
                        plugin_id,
                        derivatives.len()
                    );
                    for (derivative_id, derivative) in derivatives {
                        if store.contains(&derivative_id) {
                            warn!(
                                "[{}] Derivative '{}' replaces an existing definition",
                                self.plugin_type(),
                                derivative_id
                            );
                        }
                        store.insert(derivative_id, derivative);
                    }
                }
                Err(e) => warn!("[{}] Dropping '{}': {}", self.plugin_type(), plugin_id, e),
            }
        }

        Ok(store)
    }

    fn definition(
        &self,
        plugin_id: &str,
        exception_on_invalid: bool,
    ) -> Result<Option<PluginDefinition>> {
        match split_derivative_id(plugin_id) {
            (base_plugin_id, Some(derivative_id)) => self.single_derivative(
                plugin_id,
                base_plugin_id,
                derivative_id,
                exception_on_invalid,
            ),
            (_, None) => self.plain_definition(plugin_id, exception_on_invalid),
        }
    }

    fn clear_cached_definitions(&self) {
        self.derivers.lock().clear();
        self.inner.clear_cached_definitions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::deriver::FnDeriver;
    use crate::plugin::discovery::{StaticDiscovery, YamlDiscovery};
    use indexmap::IndexMap;
    use plexus_foundation::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> DeriverRegistry {
        let mut registry = DeriverRegistry::new();
        registry.register("colors", || {
            Arc::new(FnDeriver::new(|base: &PluginDefinition| {
                let mut derivatives = IndexMap::new();
                for color in ["red", "blue"] {
                    let label = format!("{} {}", base.get_str("label").unwrap_or(""), color);
                    derivatives.insert(
                        color.to_string(),
                        PluginDefinition::default()
                            .with("label", label)
                            .with("settings", json!({ "color": color })),
                    );
                }
                Ok(derivatives)
            })) as Arc<dyn Deriver>
        });
        registry.register("nothing", || {
            Arc::new(FnDeriver::new(|_: &PluginDefinition| Ok(IndexMap::new()))) as Arc<dyn Deriver>
        });
        registry
    }

    fn discovery() -> DerivativeDiscovery<StaticDiscovery> {
        let raw = StaticDiscovery::new("swatch")
            .with_definition(
                "base",
                PluginDefinition::default()
                    .with("deriver", "colors")
                    .with("label", "Swatch")
                    .with("settings", json!({ "size": 3, "color": "none" })),
            )
            .with_definition("empty", PluginDefinition::default().with("deriver", "nothing"))
            .with_definition("plain", PluginDefinition::default().with("label", "Plain"));
        DerivativeDiscovery::new(raw, registry())
    }

    #[test]
    fn test_bulk_expansion() {
        let definitions = discovery().definitions().unwrap();

        assert_eq!(
            definitions.ids().collect::<Vec<_>>(),
            vec!["base:red", "base:blue", "plain"]
        );
        assert!(!definitions.contains("base"));
        assert!(!definitions.contains("empty"));

        let red = definitions.get("base:red").unwrap();
        assert_eq!(red.id(), Some("base:red"));
        assert_eq!(red.base_plugin_id(), Some("base"));
        assert_eq!(red.derivative_id(), Some("red"));
        assert_eq!(red.get("label"), Some(&json!("Swatch red")));
        assert_eq!(red.get("settings"), Some(&json!({ "size": 3, "color": "red" })));
        assert!(red.is_derivative());
    }

    #[test]
    fn test_single_lookup_matches_bulk() {
        let discovery = discovery();
        let bulk = discovery.definitions().unwrap();

        let blue = discovery.definition("base:blue", true).unwrap().unwrap();
        assert_eq!(Some(&blue), bulk.get("base:blue"));

        let plain = discovery.definition("plain", true).unwrap().unwrap();
        assert_eq!(Some(&plain), bulk.get("plain"));
    }

    #[test]
    fn test_single_lookup_not_found() {
        let discovery = discovery();

        assert!(discovery.definition("base:green", true).unwrap_err().is_not_found());
        assert!(discovery.definition("base:green", false).unwrap().is_none());
        // 기본 정의 자체는 노출되지 않음
        assert!(discovery.definition("base", true).unwrap_err().is_not_found());
        assert!(discovery.definition("missing:red", false).unwrap().is_none());
    }

    #[test]
    fn test_unknown_deriver_lenient_in_bulk_strict_on_lookup() {
        let raw = StaticDiscovery::new("swatch")
            .with_definition("ghost", PluginDefinition::default().with("deriver", "unregistered"))
            .with_definition("plain", PluginDefinition::default());
        let discovery = DerivativeDiscovery::new(raw, registry());

        assert_eq!(discovery.definitions().unwrap().ids().collect::<Vec<_>>(), vec!["plain"]);

        let err = discovery.definition("ghost:any", true).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn test_deriver_rebuilt_when_base_changes() {
        let mut registry = registry();
        registry.register("shapes", || {
            Arc::new(FnDeriver::new(|_: &PluginDefinition| {
                let mut derivatives = IndexMap::new();
                derivatives.insert("square".to_string(), PluginDefinition::default());
                Ok(derivatives)
            })) as Arc<dyn Deriver>
        });

        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("system.swatch.yml");
        std::fs::write(&file, "base:\n  deriver: colors\n").unwrap();
        let raw = YamlDiscovery::new("swatch", vec![("system", root.path())]).keyed_by_plugin();
        let discovery = DerivativeDiscovery::new(raw, registry);

        let before = discovery.definitions().unwrap();
        assert_eq!(before.ids().collect::<Vec<_>>(), vec!["base:red", "base:blue"]);

        std::fs::write(&file, "base:\n  deriver: shapes\n").unwrap();
        let after = discovery.definitions().unwrap();
        assert_eq!(after.ids().collect::<Vec<_>>(), vec!["base:square"]);
        assert_eq!(after.get("base:square").unwrap().deriver(), Some("shapes"));
        assert!(discovery.definition("base:red", false).unwrap().is_none());
    }

    #[test]
    fn test_single_lookup_does_not_expand_everything() {
        struct IndexedDeriver {
            full_expansions: Arc<AtomicUsize>,
        }

        impl Deriver for IndexedDeriver {
            fn derivative_definitions(
                &self,
                _base: &PluginDefinition,
            ) -> Result<IndexMap<String, PluginDefinition>> {
                self.full_expansions.fetch_add(1, Ordering::SeqCst);
                let mut derivatives = IndexMap::new();
                for page in ["home", "about"] {
                    derivatives
                        .insert(page.to_string(), PluginDefinition::default().with("page", page));
                }
                Ok(derivatives)
            }

            fn derivative_definition(
                &self,
                derivative_id: &str,
                _base: &PluginDefinition,
            ) -> Result<Option<PluginDefinition>> {
                Ok(["home", "about"]
                    .contains(&derivative_id)
                    .then(|| PluginDefinition::default().with("page", derivative_id)))
            }
        }

        let full_expansions = Arc::new(AtomicUsize::new(0));
        let counter = full_expansions.clone();
        let mut registry = DeriverRegistry::new();
        registry.register("pages", move || {
            Arc::new(IndexedDeriver {
                full_expansions: counter.clone(),
            }) as Arc<dyn Deriver>
        });

        let raw = StaticDiscovery::new("page")
            .with_definition("page", PluginDefinition::default().with("deriver", "pages"));
        let discovery = DerivativeDiscovery::new(raw, registry);

        let about = discovery.definition("page:about", true).unwrap().unwrap();
        assert_eq!(about.get("page"), Some(&json!("about")));
        assert!(discovery.definition("page:contact", false).unwrap().is_none());
        assert_eq!(full_expansions.load(Ordering::SeqCst), 0);

        discovery.definitions().unwrap();
        assert_eq!(full_expansions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_colon_in_plain_id() {
        let raw = StaticDiscovery::new("swatch")
            .with_definition("ns:item", PluginDefinition::default().with("label", "x"));
        let discovery = DerivativeDiscovery::new(raw, registry());

        assert!(discovery.definition("ns:item", true).unwrap().is_some());
        assert!(discovery.definitions().unwrap().contains("ns:item"));
    }
}
