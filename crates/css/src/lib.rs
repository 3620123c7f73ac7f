//! Inline, selector-based styling for trees of UI nodes.
//!
//! Style definitions are nested selector maps. They are registered into a
//! global scope or a named local scope, compiled into weighted rules, and
//! resolved per node into one flat [`Declaration`]:
//!
//! ```
//! use css::{NodeContext, StyleEngine, StyleMap, Value};
//!
//! let engine = StyleEngine::new();
//! engine.set_global_style(
//!     &StyleMap::new().with(
//!         "item",
//!         StyleMap::new()
//!             .with("color", "gray")
//!             .with("&:first-child", StyleMap::new().with("color", "blue")),
//!     ),
//! );
//! let resolver = engine.resolver(None);
//! let first = NodeContext::new(["item"]).at(1, 3);
//! assert_eq!(resolver.resolve("item", &first).get("color"), Some(&Value::from("blue")));
//! ```

mod engine;

pub use engine::StyleEngine;

pub use css_cascade::{
    CascadeLayer, CascadePriority, CascadeRule, DeclarationSource, RuleIndex, RuleKind,
    ScopeOrigin, build_rule_index, cascade_merge, compare_priority, extract_rules,
};
pub use css_orchestrator::{
    CascadeResolver, Generation, InvalidationBus, ListenerId, ResolverConfig, ScopeEvent,
    ScopeGeneration, ScopeStore, ScopeView,
};
pub use css_selectors::{CompiledSelector, Fragment, NthExpr, Specificity, compile};
pub use css_syntax::{
    Declaration, NodeContext, NodePathKey, Props, StyleFn, StyleMap, StyleValue, Value, normalize,
};
pub use css_variables::{VariableError, VariableStore};
