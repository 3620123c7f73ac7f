use anyhow::Result;
use css_orchestrator::{CascadeResolver, ResolverConfig, ScopeStore};
use css_syntax::{StyleMap, Value};
use log::debug;
use std::sync::Arc;

/// Entry point tying the scope store to resolvers.
///
/// Cloning is cheap; every clone shares the same scopes and variables.
#[derive(Clone, Default)]
pub struct StyleEngine {
    store: Arc<ScopeStore>,
    config: ResolverConfig,
}

impl StyleEngine {
    /// Engine with default resolver settings and an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose resolvers use `config`.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            store: Arc::new(ScopeStore::new()),
            config,
        }
    }

    /// Scope store shared by every resolver of this engine.
    #[inline]
    pub const fn store(&self) -> &Arc<ScopeStore> {
        &self.store
    }

    /// Replace the global rules.
    pub fn set_global_style(&self, definition: &StyleMap) {
        self.store.register_global_scope(definition);
    }

    /// Replace the global rules with a JSON definition.
    ///
    /// # Errors
    /// Returns an error if `definition` is not a JSON object of strings,
    /// numbers, booleans and nested objects.
    pub fn set_global_style_json(&self, definition: &serde_json::Value) -> Result<()> {
        let definition = StyleMap::from_json(definition)?;
        self.set_global_style(&definition);
        Ok(())
    }

    /// Register `definition` under the local scope `name` and return a
    /// resolver bound to it.
    pub fn create_local(&self, name: &str, definition: &StyleMap) -> CascadeResolver {
        self.store.register_local_scope(name, definition);
        debug!("created local scope `{name}`");
        self.resolver(Some(name))
    }

    /// [`Self::create_local`] for a JSON definition.
    ///
    /// # Errors
    /// Returns an error if `definition` is not a valid style object.
    pub fn create_local_json(
        &self,
        name: &str,
        definition: &serde_json::Value,
    ) -> Result<CascadeResolver> {
        let definition = StyleMap::from_json(definition)?;
        Ok(self.create_local(name, &definition))
    }

    /// Resolver reading the global scope and, if given, one local scope.
    /// The local scope may be registered later.
    pub fn resolver(&self, scope: Option<&str>) -> CascadeResolver {
        CascadeResolver::new(Arc::clone(&self.store), scope, self.config)
    }

    /// Set one custom property used by later registrations.
    ///
    /// # Errors
    /// Returns an error if `key` does not start with `--`.
    pub fn set_variable(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.store.set_variable(key, value)
    }

    /// Set several custom properties at once.
    ///
    /// # Errors
    /// Returns an error, storing nothing, if any key does not start with `--`.
    pub fn set_variables<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.store.set_variables(entries)
    }

    /// Current value of one custom property.
    pub fn variable(&self, key: &str) -> Option<Value> {
        self.store.variable(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_syntax::NodeContext;
    use serde_json::json;

    #[test]
    fn json_and_map_definitions_agree() {
        let engine = StyleEngine::new();
        engine
            .set_global_style_json(&json!({ "item": { "color": "red", "opacity": 0.5 } }))
            .unwrap();
        let resolved = engine.resolver(None).resolve("item", &NodeContext::new(["item"]));
        assert_eq!(resolved.get("color"), Some(&Value::from("red")));
        assert_eq!(resolved.get("opacity"), Some(&Value::from(0.5)));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let engine = StyleEngine::new();
        assert!(engine.set_global_style_json(&json!(["item"])).is_err());
        assert!(engine.create_local_json("demo", &json!(3)).is_err());
        assert!(!engine.store().has_local_scope("demo"));
    }

    #[test]
    fn clones_share_scopes() {
        let engine = StyleEngine::new();
        let other = engine.clone();
        other.set_global_style(&StyleMap::new().with("item", StyleMap::new().with("gap", 4)));
        let resolved = engine.resolver(None).resolve("item", &NodeContext::new(["item"]));
        assert_eq!(resolved.get("gap"), Some(&Value::from(4)));
    }

    #[test]
    fn config_reaches_resolvers() {
        let engine = StyleEngine::with_config(ResolverConfig::default().with_memo_capacity(0));
        let resolver = engine.resolver(None);
        resolver.resolve("item", &NodeContext::new(["item"]));
        assert_eq!(resolver.memo_len(), 0);
    }
}
