//! Flat property maps produced by rules and by the cascade.

use crate::Value;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// Property name to primitive value.
pub type Props = BTreeMap<String, Value>;

/// A flat set of property declarations.
///
/// Keys are kept sorted so two declarations with the same content compare and
/// print identically regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Declaration {
    /// Backing property storage.
    props: Props,
}

impl Declaration {
    /// Create an empty declaration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Declaration::set`].
    #[inline]
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, replacing any previous value.
    #[inline]
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.props.insert(name.to_owned(), value.into());
    }

    /// Look up a property.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// True when no property is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Number of properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Properties in name order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.props.iter()
    }

    /// Copy every property of `other` into `self`; `other` wins on conflict.
    pub fn merge_from(&mut self, other: &Self) {
        for (name, value) in &other.props {
            self.props.insert(name.clone(), value.clone());
        }
    }

    /// Borrow the underlying map.
    #[inline]
    pub const fn props(&self) -> &Props {
        &self.props
    }
}

impl<'decl> IntoIterator for &'decl Declaration {
    type Item = (&'decl String, &'decl Value);
    type IntoIter = Iter<'decl, String, Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.props.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Declaration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            props: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl From<Props> for Declaration {
    #[inline]
    fn from(props: Props) -> Self {
        Self { props }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_left_to_right() {
        let mut base = Declaration::new().with("color", "black").with("margin", 1);
        let over = Declaration::new().with("color", "green");
        base.merge_from(&over);
        assert_eq!(base.get("color"), Some(&Value::from("green")));
        assert_eq!(base.get("margin"), Some(&Value::from(1)));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn serializes_as_plain_object() {
        let decl: Declaration = [("color", "red")].into_iter().collect();
        let json = serde_json::to_string(&decl).unwrap();
        assert_eq!(json, r#"{"color":"red"}"#);
    }
}
