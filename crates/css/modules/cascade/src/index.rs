//! Rules grouped by base class name.

use crate::CascadeRule;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A rule stamped with its position in the index.
#[derive(Clone, Debug)]
pub struct IndexedRule {
    /// Insertion position across the whole index; later wins ties.
    pub order: u32,
    pub rule: Arc<CascadeRule>,
}

/// Base class name to rules, style and function rules kept apart, each list
/// in insertion order.
#[derive(Clone, Debug, Default)]
pub struct RuleIndex {
    style: FxHashMap<String, Vec<IndexedRule>>,
    function: FxHashMap<String, Vec<IndexedRule>>,
    next_order: u32,
}

impl RuleIndex {
    /// Empty index.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule after every rule already present.
    pub fn push(&mut self, rule: CascadeRule) {
        self.push_shared(Arc::new(rule));
    }

    fn push_shared(&mut self, rule: Arc<CascadeRule>) {
        let order = self.next_order;
        self.next_order = self.next_order.saturating_add(1);
        let lists = if rule.is_dynamic() {
            &mut self.function
        } else {
            &mut self.style
        };
        lists
            .entry(rule.base_class_name().to_owned())
            .or_default()
            .push(IndexedRule { order, rule });
    }

    /// Append every rule of `other`, keeping its relative order and placing it
    /// after the rules already present.
    pub fn append(&mut self, other: &Self) {
        let mut incoming: Vec<&IndexedRule> = other
            .style
            .values()
            .chain(other.function.values())
            .flatten()
            .collect();
        incoming.sort_by_key(|indexed| indexed.order);
        for indexed in incoming {
            self.push_shared(Arc::clone(&indexed.rule));
        }
    }

    /// Style rules for `base_class_name`, in insertion order.
    #[inline]
    pub fn style_rules(&self, base_class_name: &str) -> &[IndexedRule] {
        self.style.get(base_class_name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Function rules for `base_class_name`, in insertion order.
    #[inline]
    pub fn function_rules(&self, base_class_name: &str) -> &[IndexedRule] {
        self.function.get(base_class_name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of rules.
    #[inline]
    pub const fn len(&self) -> usize {
        self.next_order as usize
    }

    /// True when no rule was pushed.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.next_order == 0
    }

    /// Every base class name with at least one rule, sorted.
    pub fn base_class_names(&self) -> BTreeSet<&str> {
        self.style
            .keys()
            .chain(self.function.keys())
            .map(String::as_str)
            .collect()
    }
}
