//! Memoized cascade resolution for one scope binding.

use crate::bus::{ListenerId, ScopeEvent};
use crate::generation::ScopeGeneration;
use crate::scope::ScopeStore;
use css_syntax::{Declaration, NodeContext, NodePathKey};
use log::trace;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

/// Default number of memoized results kept per resolver.
pub const DEFAULT_MEMO_CAPACITY: usize = 4096;

/// Resolver settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// The memo is emptied when it would grow past this many entries.
    /// Zero disables memoization.
    pub memo_capacity: usize,
}

impl ResolverConfig {
    /// Set [`Self::memo_capacity`].
    #[must_use]
    pub const fn with_memo_capacity(mut self, memo_capacity: usize) -> Self {
        self.memo_capacity = memo_capacity;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }
}

/// Memo key: the scope generations the result was computed from, the node's
/// path key and the requested class (`None` for a whole-node resolution).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MemoKey {
    generation: ScopeGeneration,
    node: NodePathKey,
    base: Option<String>,
}

#[derive(Default)]
struct ResolveMemo {
    /// Generation every stored entry was computed at.
    generation: Option<ScopeGeneration>,
    entries: FxHashMap<MemoKey, Arc<Declaration>>,
}

impl ResolveMemo {
    fn get(&self, key: &MemoKey) -> Option<Arc<Declaration>> {
        self.entries.get(key).map(Arc::clone)
    }

    fn insert(&mut self, key: MemoKey, value: Arc<Declaration>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        if self.generation != Some(key.generation) {
            self.entries.clear();
            self.generation = Some(key.generation);
        }
        if self.entries.len() >= capacity {
            trace!("resolver memo reached {capacity} entries; clearing");
            self.entries.clear();
        }
        self.entries.insert(key, value);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.generation = None;
    }
}

/// Resolves node styles against the global scope and at most one local scope.
///
/// Results are memoized per [`NodePathKey`] and dropped whenever a bound scope
/// is re-registered.
pub struct CascadeResolver {
    store: Arc<ScopeStore>,
    /// Bound local scope.
    scope: Option<String>,
    memo: Arc<Mutex<ResolveMemo>>,
    listener: ListenerId,
    config: ResolverConfig,
}

impl CascadeResolver {
    /// Bind a resolver to the global scope of `store` and, if given, the
    /// local scope `scope`. The local scope need not exist yet.
    pub fn new(store: Arc<ScopeStore>, scope: Option<&str>, config: ResolverConfig) -> Self {
        let memo = Arc::new(Mutex::new(ResolveMemo::default()));
        let listener = subscribe_invalidation(&store, Arc::downgrade(&memo), scope.map(ToOwned::to_owned));
        Self {
            store,
            scope: scope.map(ToOwned::to_owned),
            memo,
            listener,
            config,
        }
    }

    /// Merged declaration for `base_class_name` on the node.
    pub fn resolve(&self, base_class_name: &str, ctx: &NodeContext) -> Arc<Declaration> {
        self.resolve_memoized(Some(base_class_name), ctx)
    }

    /// Merged declaration for every class of the node in one cascade.
    pub fn resolve_node(&self, ctx: &NodeContext) -> Arc<Declaration> {
        self.resolve_memoized(None, ctx)
    }

    fn resolve_memoized(&self, base: Option<&str>, ctx: &NodeContext) -> Arc<Declaration> {
        let view = self.store.view(self.scope.as_deref());
        let key = MemoKey {
            generation: view.generation,
            node: ctx.path_key(),
            base: base.map(ToOwned::to_owned),
        };
        if let Some(hit) = self.memo.lock().get(&key) {
            trace!("memo hit for node {:x} ({:?})", key.node.get(), key.base);
            return hit;
        }
        trace!("memo miss for node {:x} ({:?})", key.node.get(), key.base);
        let declaration = Arc::new(match base {
            Some(name) => view.cascade([name], ctx),
            None => view.cascade(ctx.current_class_list.iter().map(String::as_str), ctx),
        });
        self.memo
            .lock()
            .insert(key, Arc::clone(&declaration), self.config.memo_capacity);
        declaration
    }

    /// Drop every memoized result.
    pub fn clear_memo(&self) {
        self.memo.lock().clear();
    }

    /// Number of memoized results.
    pub fn memo_len(&self) -> usize {
        self.memo.lock().entries.len()
    }

    /// Bound local scope, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Settings the resolver was created with.
    pub const fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Store the resolver reads from.
    pub const fn store(&self) -> &Arc<ScopeStore> {
        &self.store
    }
}

impl Drop for CascadeResolver {
    fn drop(&mut self) {
        self.store.bus().unsubscribe(self.listener);
    }
}

/// Clear `memo` whenever an event touches the bound scope.
fn subscribe_invalidation(
    store: &ScopeStore,
    memo: Weak<Mutex<ResolveMemo>>,
    scope: Option<String>,
) -> ListenerId {
    store.bus().subscribe(move |event: &ScopeEvent| {
        if !event.affects(scope.as_deref()) {
            return;
        }
        if let Some(memo) = memo.upgrade() {
            trace!("{event:?} invalidates resolver memo");
            memo.lock().clear();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_syntax::{StyleMap, Value};

    fn color_of(declaration: &Declaration) -> Option<&Value> {
        declaration.get("color")
    }

    #[test]
    fn repeated_resolution_hits_the_memo() {
        let store = Arc::new(ScopeStore::new());
        store.register_global_scope(&StyleMap::new().with("item", StyleMap::new().with("color", "red")));
        let resolver = store.resolver(None);
        let ctx = NodeContext::new(["item"]);
        let first = resolver.resolve("item", &ctx);
        let second = resolver.resolve("item", &ctx);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.memo_len(), 1);
    }

    #[test]
    fn contexts_differing_in_flags_or_siblings_are_memoized_apart() {
        let store = Arc::new(ScopeStore::new());
        store.register_global_scope(
            &StyleMap::new()
                .with("item", StyleMap::new().with("color", "gray"))
                .with("item:first-child", StyleMap::new().with("color", "blue"))
                .with(
                    "item.counted",
                    css_syntax::StyleFn::new(|_, ctx| {
                        Some(Declaration::new().with("siblings", ctx.sibling_class_list.len() as f64))
                    }),
                ),
        );
        let resolver = store.resolver(None);
        let first = NodeContext::new(["item"]);
        let mut not_first = first.clone();
        not_first.is_first = false;
        assert_eq!(color_of(&resolver.resolve("item", &first)), Some(&Value::from("blue")));
        assert_eq!(color_of(&resolver.resolve("item", &not_first)), Some(&Value::from("gray")));

        let lone = NodeContext::new(["item", "counted"]);
        let with_siblings = NodeContext::new(["item", "counted"])
            .with_siblings(&[NodeContext::new(["item"]), NodeContext::new(["item"])]);
        assert_eq!(resolver.resolve("item", &lone).get("siblings"), Some(&Value::from(0)));
        assert_eq!(
            resolver.resolve("item", &with_siblings).get("siblings"),
            Some(&Value::from(2))
        );
    }

    #[test]
    fn global_registration_invalidates() {
        let store = Arc::new(ScopeStore::new());
        store.register_global_scope(&StyleMap::new().with("item", StyleMap::new().with("color", "red")));
        let resolver = store.resolver(None);
        let ctx = NodeContext::new(["item"]);
        assert_eq!(color_of(&resolver.resolve("item", &ctx)), Some(&Value::from("red")));
        store.register_global_scope(&StyleMap::new().with("item", StyleMap::new().with("color", "blue")));
        assert_eq!(resolver.memo_len(), 0);
        assert_eq!(color_of(&resolver.resolve("item", &ctx)), Some(&Value::from("blue")));
    }

    #[test]
    fn other_local_scopes_do_not_invalidate() {
        let store = Arc::new(ScopeStore::new());
        let resolver = store.resolver(Some("demo"));
        resolver.resolve("item", &NodeContext::new(["item"]));
        store.register_local_scope("other", &StyleMap::new().with("item", StyleMap::new().with("color", "red")));
        assert_eq!(resolver.memo_len(), 1);
        store.register_local_scope("demo", &StyleMap::new().with("item", StyleMap::new().with("color", "red")));
        assert_eq!(resolver.memo_len(), 0);
    }

    #[test]
    fn capacity_bounds_the_memo() {
        let store = Arc::new(ScopeStore::new());
        let resolver = CascadeResolver::new(
            Arc::clone(&store),
            None,
            ResolverConfig::default().with_memo_capacity(2),
        );
        for index in 1..=5 {
            resolver.resolve("item", &NodeContext::new(["item"]).at(index, 5));
        }
        assert!(resolver.memo_len() <= 2);
        let disabled = CascadeResolver::new(store, None, ResolverConfig::default().with_memo_capacity(0));
        disabled.resolve("item", &NodeContext::new(["item"]));
        assert_eq!(disabled.memo_len(), 0);
    }

    #[test]
    fn dropping_a_resolver_unsubscribes() {
        let store = Arc::new(ScopeStore::new());
        let resolver = store.resolver(None);
        assert_eq!(store.bus().listener_count(), 1);
        drop(resolver);
        assert_eq!(store.bus().listener_count(), 0);
    }

    #[test]
    fn clear_memo_empties_results() {
        let store = Arc::new(ScopeStore::new());
        let resolver = store.resolver(None);
        resolver.resolve("item", &NodeContext::new(["item"]));
        resolver.clear_memo();
        assert_eq!(resolver.memo_len(), 0);
    }
}
