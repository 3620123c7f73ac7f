//! Selector compilation and matching for inline style definitions.
//!
//! A selector key is a base class name (or `*`) followed by fragments:
//! - `.name` extra class tokens
//! - `[attr]`, `[attr=value]`, `[attr*=value]`, `[attr^=value]`, `[attr$=value]`
//! - `:first-child`, `:last-child`, `:only-child`, `:empty`
//! - `:nth-child(expr)`
//! - `:not(x)`, `:has(x)` and the fused `:not(:has(x))` / `:has(:not(x))`
//!
//! There are no combinators: ancestry is expressed by nesting keys in the
//! definition. Malformed selectors compile to a selector that never matches.

mod cache;
mod matcher;
mod nth;
mod parser;
mod specificity;

use css_syntax::{NodeContext, UNIVERSAL, Value};
use std::sync::Arc;

// Re-export public API
pub use cache::{compile, compiled_selector_count};
pub use nth::NthExpr;
pub use specificity::Specificity;

/// An adapter that abstracts node access for selector matching.
pub trait ElementAdapter {
    /// True if the node carries the class token.
    fn contains_class(&self, class: &str) -> bool;

    /// Attribute lookup for attribute selectors.
    fn attr(&self, name: &str) -> Option<&Value>;

    /// 1-based position among siblings.
    fn position(&self) -> usize;

    /// Answers `:first-child`.
    fn is_first(&self) -> bool;

    /// Answers `:last-child`.
    fn is_last(&self) -> bool;

    /// Answers `:only-child`.
    fn is_only_child(&self) -> bool;

    /// True when the node has no children.
    fn is_empty(&self) -> bool;

    /// Direct children, searched level by level by `:has`.
    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

impl ElementAdapter for NodeContext {
    #[inline]
    fn contains_class(&self, class: &str) -> bool {
        self.has_class(class)
    }

    #[inline]
    fn attr(&self, name: &str) -> Option<&Value> {
        self.prop(name)
    }

    #[inline]
    fn position(&self) -> usize {
        self.current_index
    }

    #[inline]
    fn is_first(&self) -> bool {
        self.is_first
    }

    #[inline]
    fn is_last(&self) -> bool {
        self.is_last
    }

    #[inline]
    fn is_only_child(&self) -> bool {
        self.is_only_child
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.is_empty
    }

    #[inline]
    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Attribute comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equals,
    /// `[attr*=value]`
    Contains,
    /// `[attr^=value]`
    Prefix,
    /// `[attr$=value]`
    Suffix,
}

/// An attribute selector with its value already unquoted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Prop name looked up on the node.
    pub name: String,
    pub operator: AttrOperator,
    /// Expected text; empty for [`AttrOperator::Exists`].
    pub value: String,
}

/// Pseudo-classes answered from positional flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Structural {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
}

/// One condition of a compiled selector beyond its base class.
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    /// `.name`
    Class(String),
    Attribute(AttributeSelector),
    Structural(Structural),
    NthChild(NthExpr),
    /// `:not(:has(x))` or `:has(:not(x))`: no descendant matches `x`.
    HasNone(Arc<CompiledSelector>),
    Not(Arc<CompiledSelector>),
    Has(Arc<CompiledSelector>),
}

impl Fragment {
    /// Evaluation order; cheap local checks first, descendant searches last.
    pub(crate) const fn rank(&self) -> u8 {
        match self {
            Self::Class(_) => 0,
            Self::Attribute(_) => 1,
            Self::Structural(_) => 2,
            Self::NthChild(_) => 3,
            Self::HasNone(_) => 4,
            Self::Not(_) => 5,
            Self::Has(_) => 6,
        }
    }
}

/// A selector key compiled into its base class, fragments and weight.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledSelector {
    /// The exact key this was compiled from.
    pub source: String,
    /// Leading class token, or `*`.
    pub base_class_name: String,
    pub weight: Specificity,
    /// Conditions in evaluation order: local checks before descendant searches.
    pub fragments: Vec<Fragment>,
    /// Set when the key could not be parsed; such a selector never matches.
    pub malformed: bool,
}

impl CompiledSelector {
    /// True for the bare universal selector `*`.
    #[inline]
    pub fn is_universal(&self) -> bool {
        self.source == UNIVERSAL
    }

    /// Test the selector against a node.
    #[inline]
    pub fn matches<E: ElementAdapter>(&self, element: &E) -> bool {
        matcher::matches(self, element)
    }
}
