//! Global and local rule scopes.
//!
//! The global scope is rebuilt wholesale on each registration. Local scopes
//! are named and grow by appending; registering an existing name logs a
//! warning and merges. Each scope sits behind its own lock and publishes an
//! immutable `Arc<RuleIndex>` snapshot, so readers never hold a lock while
//! matching.

use crate::bus::{InvalidationBus, ScopeEvent};
use crate::generation::{Generation, GenerationCounter, ScopeGeneration};
use crate::resolver::{CascadeResolver, ResolverConfig};
use anyhow::Result;
use css_cascade::{CascadeLayer, RuleIndex, ScopeOrigin, build_rule_index, cascade};
use css_syntax::{Declaration, NodeContext, StyleMap, Value};
use css_variables::VariableStore;
use log::warn;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A named set of rules and the generation it was last changed in.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    /// `None` for the global scope.
    pub name: Option<String>,
    pub rules: Arc<RuleIndex>,
    pub generation: Generation,
}

/// Snapshot of the scopes a resolver reads: global first, then local.
#[derive(Clone, Debug)]
pub struct ScopeView {
    pub global: Arc<RuleIndex>,
    pub local: Option<Arc<RuleIndex>>,
    pub generation: ScopeGeneration,
}

impl ScopeView {
    /// Match and merge every class in `base_class_names` against `ctx`.
    pub fn cascade<'name>(
        &self,
        base_class_names: impl IntoIterator<Item = &'name str>,
        ctx: &NodeContext,
    ) -> Declaration {
        let mut layers = vec![CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &self.global,
        }];
        if let Some(local) = &self.local {
            layers.push(CascadeLayer {
                origin: ScopeOrigin::Local,
                rules: local,
            });
        }
        cascade(&layers, base_class_names, ctx)
    }
}

/// Owner of every scope, the variable store and the invalidation bus.
#[derive(Default)]
pub struct ScopeStore {
    global: RwLock<Scope>,
    locals: RwLock<FxHashMap<String, Arc<RwLock<Scope>>>>,
    variables: RwLock<VariableStore>,
    bus: InvalidationBus,
    generations: GenerationCounter,
}

impl ScopeStore {
    /// Empty store: no rules, no local scopes, no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the global rules with those of `definition`.
    pub fn register_global_scope(&self, definition: &StyleMap) {
        let rules = build_rule_index(definition, &self.variables.read());
        let rule_count = rules.len();
        let generation = {
            let mut global = self.global.write();
            let generation = self.generations.increment();
            global.rules = Arc::new(rules);
            global.generation = generation;
            generation
        };
        tracing::debug!(
            "registered global scope: {rule_count} rules at generation {}",
            generation.get()
        );
        self.bus.publish(&ScopeEvent::GlobalChanged);
    }

    /// Append the rules of `definition` to the local scope `name`, creating
    /// it if needed.
    pub fn register_local_scope(&self, name: &str, definition: &StyleMap) {
        let rules = build_rule_index(definition, &self.variables.read());
        let rule_count = rules.len();
        let scope = {
            let mut locals = self.locals.write();
            if locals.contains_key(name) {
                warn!("local scope `{name}` is already registered; merging new rules into it");
            }
            Arc::clone(locals.entry(name.to_owned()).or_insert_with(|| {
                Arc::new(RwLock::new(Scope {
                    name: Some(name.to_owned()),
                    ..Scope::default()
                }))
            }))
        };
        let generation = {
            let mut local = scope.write();
            let mut merged = RuleIndex::clone(&local.rules);
            merged.append(&rules);
            let generation = self.generations.increment();
            local.rules = Arc::new(merged);
            local.generation = generation;
            generation
        };
        tracing::debug!(
            "registered local scope `{name}`: {rule_count} rules at generation {}",
            generation.get()
        );
        self.bus.publish(&ScopeEvent::LocalChanged(name.to_owned()));
    }

    /// Snapshot the global scope and, if given and registered, one local
    /// scope.
    pub fn view(&self, scope: Option<&str>) -> ScopeView {
        let (global, global_generation) = {
            let global = self.global.read();
            (Arc::clone(&global.rules), global.generation)
        };
        let local = scope.and_then(|name| {
            let locals = self.locals.read();
            let entry = locals.get(name)?;
            let local = entry.read();
            Some((Arc::clone(&local.rules), local.generation))
        });
        ScopeView {
            global,
            generation: ScopeGeneration {
                global: global_generation,
                local: local.as_ref().map(|(_, generation)| *generation),
            },
            local: local.map(|(rules, _)| rules),
        }
    }

    /// True once `name` has been registered.
    pub fn has_local_scope(&self, name: &str) -> bool {
        self.locals.read().contains_key(name)
    }

    /// Registered local scope names, sorted.
    pub fn local_scope_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locals.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Bus carrying this store's registration events.
    #[inline]
    pub const fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    /// Set one custom property used by later registrations.
    ///
    /// # Errors
    /// Returns an error if `key` does not start with `--`.
    pub fn set_variable(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.variables.write().set(key, value)?;
        Ok(())
    }

    /// Set several custom properties; none are stored if any key is invalid.
    ///
    /// # Errors
    /// Returns an error if any key does not start with `--`.
    pub fn set_variables<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.variables.write().set_all(entries)?;
        Ok(())
    }

    /// Current value of one custom property.
    pub fn variable(&self, key: &str) -> Option<Value> {
        self.variables.read().get(key).cloned()
    }

    /// Copy of every custom property.
    pub fn variables(&self) -> VariableStore {
        self.variables.read().clone()
    }

    /// Create a resolver reading the global scope and, optionally, `scope`.
    pub fn resolver(self: &Arc<Self>, scope: Option<&str>) -> CascadeResolver {
        CascadeResolver::new(Arc::clone(self), scope, ResolverConfig::default())
    }
}
