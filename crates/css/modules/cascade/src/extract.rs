//! Rule extraction from a normalized style definition.

use crate::{CascadeRule, DeclarationSource, RuleIndex};
use css_selectors::{CompiledSelector, Specificity, compile};
use css_syntax::{Declaration, StyleMap, StyleValue, normalize};
use css_variables::VariableStore;
use log::trace;
use std::sync::Arc;

/// Normalize a definition and extract its rules.
pub fn build_rule_index(definition: &StyleMap, variables: &VariableStore) -> RuleIndex {
    extract_rules(&normalize(definition), variables)
}

/// Walk an already normalized definition depth first and collect its rules.
///
/// Root keys start with an empty parent chain and cumulative weight zero.
/// Property values directly at the root belong to no selector and are
/// skipped.
pub fn extract_rules(definition: &StyleMap, variables: &VariableStore) -> RuleIndex {
    let mut index = RuleIndex::new();
    for (key, value) in definition {
        if value.is_primitive() {
            trace!("skipping root-level property `{key}`");
            continue;
        }
        extract_entry(key, value, &[], Specificity::ZERO, variables, &mut index);
    }
    index
}

fn extract_entry(
    key: &str,
    value: &StyleValue,
    parent_chain: &[Arc<CompiledSelector>],
    cumulative: Specificity,
    variables: &VariableStore,
    index: &mut RuleIndex,
) {
    let selector = compile(key);
    let weight = cumulative + selector.weight;
    match value {
        StyleValue::Primitive(_) => {}
        StyleValue::Function(function) => index.push(CascadeRule::new(
            selector,
            parent_chain.to_vec(),
            weight,
            DeclarationSource::Dynamic(function.clone()),
        )),
        StyleValue::Declaration(declaration) => {
            let substituted = substitute(declaration, variables);
            if !substituted.is_empty() {
                index.push(CascadeRule::new(
                    selector,
                    parent_chain.to_vec(),
                    weight,
                    DeclarationSource::Static(Arc::new(substituted)),
                ));
            }
        }
        StyleValue::Nested(children) => {
            let mut own = Declaration::new();
            for (name, child) in children {
                if let StyleValue::Primitive(primitive) = child {
                    own.set(name, variables.substitute(primitive));
                }
            }
            if !own.is_empty() {
                index.push(CascadeRule::new(
                    Arc::clone(&selector),
                    parent_chain.to_vec(),
                    weight,
                    DeclarationSource::Static(Arc::new(own)),
                ));
            }
            let mut chain = parent_chain.to_vec();
            chain.push(selector);
            for (child_key, child) in children {
                if !child.is_primitive() {
                    extract_entry(child_key, child, &chain, weight, variables, index);
                }
            }
        }
    }
}

fn substitute(declaration: &Declaration, variables: &VariableStore) -> Declaration {
    declaration
        .iter()
        .map(|(name, value)| (name.as_str(), variables.substitute(value)))
        .collect()
}
