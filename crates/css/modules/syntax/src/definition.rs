//! Style definitions: the nested selector maps users register.

use crate::{Declaration, NodeContext, Value};
use anyhow::{Result, anyhow};
use core::fmt;
use core::slice::Iter;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Signature of a dynamic style rule: `(current_index, ctx) -> declaration`.
type StyleCallback = dyn Fn(usize, &NodeContext) -> Option<Declaration> + Send + Sync;

/// A style computed per node at resolution time.
#[derive(Clone)]
pub struct StyleFn(Arc<StyleCallback>);

impl StyleFn {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, &NodeContext) -> Option<Declaration> + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Evaluate the function for a node.
    #[inline]
    pub fn call(&self, index: usize, ctx: &NodeContext) -> Option<Declaration> {
        (self.0)(index, ctx)
    }
}

impl fmt::Debug for StyleFn {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("StyleFn(..)")
    }
}

/// One value in a style definition.
#[derive(Clone, Debug)]
pub enum StyleValue {
    /// A property value at the current selector level.
    Primitive(Value),
    /// A flat declaration attached to a selector key.
    Declaration(Declaration),
    /// A nested selector map.
    Nested(StyleMap),
    /// A dynamic declaration attached to a selector key.
    Function(StyleFn),
}

impl StyleValue {
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

impl From<Value> for StyleValue {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Primitive(value)
    }
}

impl From<&str> for StyleValue {
    #[inline]
    fn from(text: &str) -> Self {
        Self::Primitive(Value::from(text))
    }
}

impl From<String> for StyleValue {
    #[inline]
    fn from(text: String) -> Self {
        Self::Primitive(Value::from(text))
    }
}

impl From<f64> for StyleValue {
    #[inline]
    fn from(number: f64) -> Self {
        Self::Primitive(Value::from(number))
    }
}

impl From<i32> for StyleValue {
    #[inline]
    fn from(number: i32) -> Self {
        Self::Primitive(Value::from(number))
    }
}

impl From<Declaration> for StyleValue {
    #[inline]
    fn from(declaration: Declaration) -> Self {
        Self::Declaration(declaration)
    }
}

impl From<StyleMap> for StyleValue {
    #[inline]
    fn from(map: StyleMap) -> Self {
        Self::Nested(map)
    }
}

impl From<StyleFn> for StyleValue {
    #[inline]
    fn from(function: StyleFn) -> Self {
        Self::Function(function)
    }
}

/// An insertion-ordered selector map.
///
/// Order matters: rules extracted from earlier keys come first in source
/// order, which decides ties between equal weights.
#[derive(Clone, Debug, Default)]
pub struct StyleMap {
    /// Entries in insertion order; keys are unique.
    entries: Vec<(String, StyleValue)>,
}

impl StyleMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StyleMap::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<StyleValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an entry. An existing key keeps its position and takes the new
    /// value.
    pub fn insert(&mut self, key: &str, value: impl Into<StyleValue>) {
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| name == key) {
            slot.1 = value;
        } else {
            self.entries.push((key.to_owned(), value));
        }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        let position = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(position).1)
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, (String, StyleValue)> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `value` under `key`, deep merging when both the existing and the
    /// incoming value are nested maps.
    pub fn merge_entry(&mut self, key: &str, value: StyleValue) {
        let existing = self
            .entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, slot)| slot);
        match (existing, value) {
            (Some(StyleValue::Nested(current)), StyleValue::Nested(incoming)) => {
                current.deep_merge(incoming);
            }
            (Some(slot), incoming) => *slot = incoming,
            (None, incoming) => self.entries.push((key.to_owned(), incoming)),
        }
    }

    /// Merge every entry of `other` into `self` (see [`StyleMap::merge_entry`]).
    pub fn deep_merge(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.merge_entry(&key, value);
        }
    }

    /// Build the static part of a definition from JSON.
    ///
    /// Strings and numbers become primitives, objects become nested maps,
    /// booleans are kept as their text and `null` entries are skipped.
    ///
    /// # Errors
    /// Returns an error if `json` is not an object or contains an array.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let JsonValue::Object(object) = json else {
            return Err(anyhow!("style definition must be a JSON object"));
        };
        let mut map = Self::new();
        for (key, entry) in object {
            let value = match entry {
                JsonValue::Null => continue,
                JsonValue::Bool(flag) => StyleValue::from(flag.to_string()),
                JsonValue::String(text) => StyleValue::from(text.as_str()),
                JsonValue::Number(number) => {
                    let Some(float) = number.as_f64() else {
                        return Err(anyhow!("number under `{key}` is not representable"));
                    };
                    StyleValue::from(float)
                }
                JsonValue::Object(_) => StyleValue::Nested(Self::from_json(entry)?),
                JsonValue::Array(_) => {
                    return Err(anyhow!("arrays are not valid style values (key `{key}`)"));
                }
            };
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'map> IntoIterator for &'map StyleMap {
    type Item = &'map (String, StyleValue);
    type IntoIter = Iter<'map, (String, StyleValue)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
