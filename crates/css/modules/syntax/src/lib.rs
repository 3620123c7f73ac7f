//! Style definition syntax: values, declarations, selector maps and the node
//! contexts selectors are matched against.
//!
//! A definition is a tree of selector keys. Each key maps to a primitive
//! property value, a flat [`Declaration`], a nested [`StyleMap`] or a
//! [`StyleFn`] evaluated per node. [`normalize`] rewrites `&` references and
//! space-separated descendant keys into plain nesting before rules are
//! extracted.

mod context;
mod declaration;
mod definition;
mod normalize;
mod value;

pub use context::{NodeContext, NodePathKey, UNIVERSAL};
pub use declaration::{Declaration, Props};
pub use definition::{StyleFn, StyleMap, StyleValue};
pub use normalize::normalize;
pub use value::Value;
