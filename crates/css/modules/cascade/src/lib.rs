//! Rule extraction and weight-ordered cascade merging.
//!
//! A definition is turned into a [`RuleIndex`] once per registration. At
//! resolution time the rules indexed under a base class are matched against
//! a node, ordered by [`compare_priority`] and merged left to right, so the
//! heaviest rule decides each property and equal weights fall back to scope,
//! rule kind and source order.

#![forbid(unsafe_code)]

mod extract;
mod index;
mod rule;

use core::cmp::Ordering;
use css_selectors::Specificity;
use css_syntax::{Declaration, NodeContext};
use std::borrow::Cow;

pub use extract::{build_rule_index, extract_rules};
pub use index::{IndexedRule, RuleIndex};
pub use rule::{CascadeRule, DeclarationSource};

/// Which scope a rule was registered in. Local rules are layered over global
/// ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeOrigin {
    Global,
    Local,
}

/// Static declarations are merged before function results of equal weight
/// from the same scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Style,
    Function,
}

/// Priority tuple used to order matched rules in the cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadePriority {
    pub weight: Specificity,
    pub origin: ScopeOrigin,
    pub kind: RuleKind,
    /// Position within the rule's index; later wins.
    pub source_order: u32,
}

impl CascadePriority {
    #[inline]
    pub const fn new(
        weight: Specificity,
        origin: ScopeOrigin,
        kind: RuleKind,
        source_order: u32,
    ) -> Self {
        Self {
            weight,
            origin,
            kind,
            source_order,
        }
    }
}

/// Compare two priorities. `Ordering::Greater` means `left` is merged later
/// and therefore wins over `right`.
pub fn compare_priority(left: &CascadePriority, right: &CascadePriority) -> Ordering {
    // Weight: heavier wins
    if left.weight != right.weight {
        return left.weight.cmp(&right.weight);
    }

    // Scope: local over global
    let left_rank = origin_rank(left.origin);
    let right_rank = origin_rank(right.origin);
    if left_rank != right_rank {
        return left_rank.cmp(&right_rank);
    }

    // Kind: function results over static declarations
    let left_kind = kind_rank(left.kind);
    let right_kind = kind_rank(right.kind);
    if left_kind != right_kind {
        return left_kind.cmp(&right_kind);
    }

    // Source order: later wins
    left.source_order.cmp(&right.source_order)
}

/// Rank origins: Global < Local.
const fn origin_rank(origin: ScopeOrigin) -> u8 {
    match origin {
        ScopeOrigin::Global => 0,
        ScopeOrigin::Local => 1,
    }
}

const fn kind_rank(kind: RuleKind) -> u8 {
    match kind {
        RuleKind::Style => 0,
        RuleKind::Function => 1,
    }
}

/// A matched rule's declaration with its priority.
#[derive(Clone, Debug)]
pub struct CascadeCandidate<'rules> {
    pub priority: CascadePriority,
    pub declaration: Cow<'rules, Declaration>,
}

/// One scope's rules as seen by the cascade.
#[derive(Clone, Copy, Debug)]
pub struct CascadeLayer<'rules> {
    pub origin: ScopeOrigin,
    pub rules: &'rules RuleIndex,
}

/// Append every rule of `layers` indexed under `base_class_name` that matches
/// `ctx`. Layers are visited in order, style rules before function rules;
/// function rules are evaluated on the spot.
pub fn collect_matches<'rules>(
    layers: &[CascadeLayer<'rules>],
    base_class_name: &str,
    ctx: &NodeContext,
    out: &mut Vec<CascadeCandidate<'rules>>,
) {
    for layer in layers {
        let groups = [
            (RuleKind::Style, layer.rules.style_rules(base_class_name)),
            (RuleKind::Function, layer.rules.function_rules(base_class_name)),
        ];
        for (kind, rules) in groups {
            for indexed in rules {
                if !indexed.rule.matches(ctx) {
                    continue;
                }
                let Some(declaration) = indexed.rule.evaluate(ctx) else {
                    continue;
                };
                out.push(CascadeCandidate {
                    priority: CascadePriority::new(
                        indexed.rule.weight,
                        layer.origin,
                        kind,
                        indexed.order,
                    ),
                    declaration,
                });
            }
        }
    }
}

/// Order candidates by priority and merge them; later entries overwrite
/// earlier ones property by property.
pub fn cascade_merge(mut candidates: Vec<CascadeCandidate<'_>>) -> Declaration {
    candidates.sort_by(|left, right| compare_priority(&left.priority, &right.priority));
    let mut merged = Declaration::new();
    for candidate in &candidates {
        merged.merge_from(&candidate.declaration);
    }
    merged
}

/// Match and merge the rules of every base class in `base_class_names`.
pub fn cascade<'name>(
    layers: &[CascadeLayer<'_>],
    base_class_names: impl IntoIterator<Item = &'name str>,
    ctx: &NodeContext,
) -> Declaration {
    let mut candidates = Vec::new();
    for base_class_name in base_class_names {
        collect_matches(layers, base_class_name, ctx, &mut candidates);
    }
    cascade_merge(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_syntax::{StyleFn, StyleMap, Value};
    use css_variables::VariableStore;

    fn index_of(definition: &StyleMap) -> RuleIndex {
        build_rule_index(definition, &VariableStore::new())
    }

    fn priority(weight: u32, origin: ScopeOrigin, kind: RuleKind, order: u32) -> CascadePriority {
        CascadePriority::new(Specificity(weight), origin, kind, order)
    }

    #[test]
    fn priority_orders_weight_then_scope_then_kind_then_order() {
        let low = priority(1, ScopeOrigin::Local, RuleKind::Function, 9);
        let high = priority(2, ScopeOrigin::Global, RuleKind::Style, 0);
        assert_eq!(compare_priority(&high, &low), Ordering::Greater);
        let global = priority(1, ScopeOrigin::Global, RuleKind::Function, 9);
        let local = priority(1, ScopeOrigin::Local, RuleKind::Style, 0);
        assert_eq!(compare_priority(&local, &global), Ordering::Greater);
        let style = priority(1, ScopeOrigin::Global, RuleKind::Style, 9);
        let function = priority(1, ScopeOrigin::Global, RuleKind::Function, 0);
        assert_eq!(compare_priority(&function, &style), Ordering::Greater);
        let early = priority(1, ScopeOrigin::Global, RuleKind::Style, 1);
        let late = priority(1, ScopeOrigin::Global, RuleKind::Style, 2);
        assert_eq!(compare_priority(&late, &early), Ordering::Greater);
    }

    #[test]
    fn heavier_rule_wins_regardless_of_order() {
        let definition = StyleMap::new()
            .with("item:first-child", StyleMap::new().with("color", "blue"))
            .with("item", StyleMap::new().with("color", "gray"));
        let rules = index_of(&definition);
        let layers = [CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &rules,
        }];
        let first = NodeContext::new(["item"]).at(1, 3);
        let second = NodeContext::new(["item"]).at(2, 3);
        assert_eq!(
            cascade(&layers, ["item"], &first).get("color"),
            Some(&Value::from("blue"))
        );
        assert_eq!(
            cascade(&layers, ["item"], &second).get("color"),
            Some(&Value::from("gray"))
        );
    }

    #[test]
    fn function_rules_receive_the_index() {
        let definition = StyleMap::new().with(
            "item",
            StyleFn::new(|index, _| Some(Declaration::new().with("z-index", index as f64))),
        );
        let rules = index_of(&definition);
        let layers = [CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &rules,
        }];
        let ctx = NodeContext::new(["item"]).at(5, 6);
        assert_eq!(
            cascade(&layers, ["item"], &ctx).get("z-index"),
            Some(&Value::from(5))
        );
    }

    #[test]
    fn parent_chain_must_match_some_ancestor() {
        let definition = StyleMap::new().with(
            "list",
            StyleMap::new().with("item", StyleMap::new().with("color", "red")),
        );
        let rules = index_of(&definition);
        let layers = [CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &rules,
        }];
        let list = NodeContext::new(["list"]).into_shared();
        let inside = NodeContext::new(["item"]).within(&list);
        let outside = NodeContext::new(["item"]);
        assert_eq!(cascade(&layers, ["item"], &inside).len(), 1);
        assert!(cascade(&layers, ["item"], &outside).is_empty());
    }

    #[test]
    fn parent_chain_fragments_are_checked_against_ancestors() {
        let definition = StyleMap::new().with(
            "list:first-child",
            StyleMap::new().with("item", StyleMap::new().with("color", "red")),
        );
        let rules = index_of(&definition);
        let layers = [CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &rules,
        }];
        let first_list = NodeContext::new(["list"]).at(1, 2).into_shared();
        let group = NodeContext::new(["group"]).within(&first_list).into_shared();
        let nested = NodeContext::new(["item"]).within(&group);
        assert_eq!(
            cascade(&layers, ["item"], &nested).get("color"),
            Some(&Value::from("red"))
        );
        let second_list = NodeContext::new(["list"]).at(2, 2).into_shared();
        let outside = NodeContext::new(["item"]).within(&second_list);
        assert!(cascade(&layers, ["item"], &outside).is_empty());
        let rule = &rules.style_rules("item")[0].rule;
        assert_eq!(rule.weight, Specificity(3));
    }

    #[test]
    fn unmatched_class_resolves_empty() {
        let rules = RuleIndex::new();
        let layers = [CascadeLayer {
            origin: ScopeOrigin::Global,
            rules: &rules,
        }];
        assert!(cascade(&layers, ["ghost"], &NodeContext::new(["ghost"])).is_empty());
    }
}
