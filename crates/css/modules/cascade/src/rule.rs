//! Cascade rules produced by extraction.

use css_selectors::{CompiledSelector, Specificity};
use css_syntax::{Declaration, NodeContext, StyleFn};
use std::borrow::Cow;
use std::sync::Arc;

/// Where a rule's declaration comes from.
#[derive(Clone, Debug)]
pub enum DeclarationSource {
    /// Fixed at extraction time.
    Static(Arc<Declaration>),
    /// Evaluated per node at resolution time.
    Dynamic(StyleFn),
}

/// A selector with its ancestor requirements, weight and declaration.
#[derive(Clone, Debug)]
pub struct CascadeRule {
    pub selector: Arc<CompiledSelector>,
    /// Ancestor selectors, root first; each must match some ancestor.
    pub parent_chain: Vec<Arc<CompiledSelector>>,
    /// Cumulative weight of the chain plus the selector itself.
    pub weight: Specificity,
    pub source: DeclarationSource,
}

impl CascadeRule {
    pub const fn new(
        selector: Arc<CompiledSelector>,
        parent_chain: Vec<Arc<CompiledSelector>>,
        weight: Specificity,
        source: DeclarationSource,
    ) -> Self {
        Self {
            selector,
            parent_chain,
            weight,
            source,
        }
    }

    /// Base class the rule is indexed under.
    #[inline]
    pub fn base_class_name(&self) -> &str {
        &self.selector.base_class_name
    }

    #[inline]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.source, DeclarationSource::Dynamic(_))
    }

    /// The selector matches the node and every non-`*` chain entry matches at
    /// least one of its ancestors.
    pub fn matches(&self, ctx: &NodeContext) -> bool {
        self.selector.matches(ctx)
            && self.parent_chain.iter().all(|required| {
                required.is_universal()
                    || ctx
                        .ancestors
                        .iter()
                        .any(|ancestor| required.matches(ancestor.as_ref()))
            })
    }

    /// Produce the rule's declaration for a node. Dynamic rules returning
    /// nothing contribute nothing.
    pub fn evaluate(&self, ctx: &NodeContext) -> Option<Cow<'_, Declaration>> {
        match &self.source {
            DeclarationSource::Static(declaration) => Some(Cow::Borrowed(declaration.as_ref())),
            DeclarationSource::Dynamic(function) => {
                function.call(ctx.current_index, ctx).map(Cow::Owned)
            }
        }
    }
}
