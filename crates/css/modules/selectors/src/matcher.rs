//! Selector matching against a single node.

use crate::{
    AttrOperator, AttributeSelector, CompiledSelector, ElementAdapter, Fragment, Structural,
};
use css_syntax::UNIVERSAL;

/// Base class membership (vacuous for `*`) and every fragment.
pub fn matches<E: ElementAdapter>(selector: &CompiledSelector, element: &E) -> bool {
    if selector.malformed {
        return false;
    }
    if selector.base_class_name != UNIVERSAL && !element.contains_class(&selector.base_class_name) {
        return false;
    }
    selector
        .fragments
        .iter()
        .all(|fragment| matches_fragment(fragment, element))
}

fn matches_fragment<E: ElementAdapter>(fragment: &Fragment, element: &E) -> bool {
    match fragment {
        Fragment::Class(class) => element.contains_class(class),
        Fragment::Attribute(attr) => matches_attribute(attr, element),
        Fragment::Structural(kind) => match kind {
            Structural::FirstChild => element.is_first(),
            Structural::LastChild => element.is_last(),
            Structural::OnlyChild => element.is_only_child(),
            Structural::Empty => element.is_empty(),
        },
        Fragment::NthChild(expr) => expr.matches(element.position()),
        Fragment::HasNone(inner) => !any_descendant_matches(inner, element),
        Fragment::Not(inner) => !matches(inner, element),
        Fragment::Has(inner) => any_descendant_matches(inner, element),
    }
}

/// Attribute values are compared through their text form.
fn matches_attribute<E: ElementAdapter>(attr: &AttributeSelector, element: &E) -> bool {
    let Some(value) = element.attr(&attr.name) else {
        return false;
    };
    let text = value.to_string();
    match attr.operator {
        AttrOperator::Exists => true,
        AttrOperator::Equals => text == attr.value,
        AttrOperator::Contains => text.contains(attr.value.as_str()),
        AttrOperator::Prefix => text.starts_with(attr.value.as_str()),
        AttrOperator::Suffix => text.ends_with(attr.value.as_str()),
    }
}

/// Breadth-first search over the descendants, one level at a time.
fn any_descendant_matches<E: ElementAdapter>(selector: &CompiledSelector, element: &E) -> bool {
    let mut level: Vec<&E> = element.children().iter().collect();
    while !level.is_empty() {
        if level.iter().any(|child| matches(selector, *child)) {
            return true;
        }
        level = level
            .into_iter()
            .flat_map(|child| child.children().iter())
            .collect();
    }
    false
}
