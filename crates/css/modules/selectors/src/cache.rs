//! Process-wide compiled selector memo.
//!
//! Each selector string is compiled at most once per process. Entries are
//! never evicted: the set of keys is bounded by the style definitions the
//! program registers.

use crate::CompiledSelector;
use crate::parser::parse_selector;
use dashmap::DashMap;
use log::trace;
use once_cell::sync::Lazy;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

/// Selector text to compiled form.
static COMPILED: Lazy<DashMap<String, Arc<CompiledSelector>, FxBuildHasher>> =
    Lazy::new(|| DashMap::with_hasher(FxBuildHasher));

/// Compile a selector key, reusing an earlier compilation of the same text.
pub fn compile(selector: &str) -> Arc<CompiledSelector> {
    if let Some(hit) = COMPILED.get(selector) {
        return Arc::clone(hit.value());
    }
    // Parsing recurses into `compile` for `:not`/`:has` arguments, so no shard
    // lock may be held here.
    let compiled = Arc::new(parse_selector(selector));
    trace!(
        "compiled selector `{selector}` (weight {})",
        compiled.weight.0
    );
    let entry = COMPILED
        .entry(selector.to_owned())
        .or_insert(compiled);
    Arc::clone(entry.value())
}

/// Number of distinct selector strings compiled so far.
pub fn compiled_selector_count() -> usize {
    COMPILED.len()
}
