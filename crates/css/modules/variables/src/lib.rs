//! Custom property store and `var()` substitution.
//!
//! Variables are flat `--name -> value` pairs. Declaration values that
//! reference them with `var(--name)` or `var(--name, fallback)` are expanded
//! when rules are extracted:
//! - A value that is exactly one `var()` call takes the variable's value as
//!   is, so a numeric variable stays numeric.
//! - Any other string has each `var()` call replaced by the text form of the
//!   resolved value.
//!
//! A reference that is missing, names a non-`--` property or closes a cycle
//! resolves to its fallback, or to the empty string without one. A `var(`
//! without a closing parenthesis is left untouched.

#![forbid(unsafe_code)]

use core::error::Error;
use core::fmt;
use css_syntax::Value;
use log::trace;
use std::collections::BTreeMap;

/// Prefix every custom property name must carry.
pub const CUSTOM_PROPERTY_PREFIX: &str = "--";

/// Rejected variable updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableError {
    /// The key does not start with `--`.
    InvalidName(String),
}

impl fmt::Display for VariableError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(
                formatter,
                "custom property `{name}` must start with `{CUSTOM_PROPERTY_PREFIX}`"
            ),
        }
    }
}

impl Error for VariableError {}

/// Flat custom property store.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    /// Values keyed by full property name, including `--`.
    values: BTreeMap<String, Value>,
}

impl VariableStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one variable.
    ///
    /// # Errors
    /// Returns [`VariableError::InvalidName`] if `key` lacks the `--` prefix.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        validate_name(key)?;
        self.values.insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Set several variables. Nothing is stored unless every key is valid.
    ///
    /// # Errors
    /// Returns [`VariableError::InvalidName`] for the first key lacking the
    /// `--` prefix.
    pub fn set_all<I, K, V>(&mut self, entries: I) -> Result<(), VariableError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let staged: Vec<(String, Value)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        for (key, _) in &staged {
            validate_name(key)?;
        }
        self.values.extend(staged);
        Ok(())
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand `var()` references in a declaration value.
    pub fn substitute(&self, value: &Value) -> Value {
        let Value::Str(text) = value else {
            return value.clone();
        };
        if !text.contains("var(") {
            return value.clone();
        }
        let mut stack = Vec::new();
        if let Some(args) = single_reference(text.trim()) {
            return self.resolve_reference(args, &mut stack);
        }
        Value::Str(self.expand(text, &mut stack))
    }

    /// Replace every `var()` call in `text` with the text of its value.
    fn expand(&self, text: &str, stack: &mut Vec<String>) -> String {
        let Some((head, after_open)) = text.split_once("var(") else {
            return text.to_owned();
        };
        let Some(close) = closing_paren(after_open) else {
            return text.to_owned();
        };
        let args = after_open.get(..close).unwrap_or("");
        let tail = after_open.get(close.saturating_add(1)..).unwrap_or("");
        let replacement = self.resolve_reference(args, stack).to_string();
        let resolved_tail = self.expand(tail, stack);
        [head, &replacement, &resolved_tail].concat()
    }

    /// Resolve the inside of one `var(...)` call.
    fn resolve_reference(&self, args: &str, stack: &mut Vec<String>) -> Value {
        let (name, fallback) = split_fallback(args);
        let candidate = if name.starts_with(CUSTOM_PROPERTY_PREFIX) {
            self.values.get(name)
        } else {
            None
        };
        match candidate {
            Some(_) if stack.iter().any(|seen| seen == name) => {
                trace!("var({name}) is part of a cycle; using fallback");
                self.fallback_value(fallback, stack)
            }
            Some(Value::Str(text)) => {
                stack.push(name.to_owned());
                let expanded = self.expand(text, stack);
                stack.pop();
                Value::Str(expanded)
            }
            Some(number @ Value::Number(_)) => number.clone(),
            None => self.fallback_value(fallback, stack),
        }
    }

    fn fallback_value(&self, fallback: Option<&str>, stack: &mut Vec<String>) -> Value {
        Value::Str(fallback.map_or_else(String::new, |text| self.expand(text, stack)))
    }
}

fn validate_name(key: &str) -> Result<(), VariableError> {
    if key.starts_with(CUSTOM_PROPERTY_PREFIX) {
        Ok(())
    } else {
        Err(VariableError::InvalidName(key.to_owned()))
    }
}

/// Byte offset of the `)` closing an already opened parenthesis.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 1_usize;
    for (index, byte) in text.bytes().enumerate() {
        match byte {
            b'(' => depth = depth.saturating_add(1),
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// If `text` is exactly one `var(...)` call, return its arguments.
fn single_reference(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("var(")?;
    let close = closing_paren(inner)?;
    if close.saturating_add(1) != inner.len() {
        return None;
    }
    inner.get(..close)
}

/// Split `--name, fallback` at the first top-level comma.
fn split_fallback(args: &str) -> (&str, Option<&str>) {
    let mut depth = 0_usize;
    for (index, byte) in args.bytes().enumerate() {
        match byte {
            b'(' => depth = depth.saturating_add(1),
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                let name = args.get(..index).unwrap_or("").trim();
                let fallback = args.get(index.saturating_add(1)..).unwrap_or("").trim();
                return (name, Some(fallback));
            }
            _ => {}
        }
    }
    (args.trim(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VariableStore {
        let mut vars = VariableStore::new();
        vars.set_all([
            ("--gap", Value::from(8)),
            ("--brand", Value::from("#336699")),
            ("--border", Value::from("1px solid var(--brand)")),
        ])
        .unwrap();
        vars
    }

    #[test]
    fn rejects_names_without_prefix() {
        let mut vars = VariableStore::new();
        assert_eq!(
            vars.set("gap", 4),
            Err(VariableError::InvalidName("gap".to_owned()))
        );
        assert!(vars.set_all([("--ok", 1), ("bad", 2)]).is_err());
        assert!(vars.is_empty(), "a failed batch stores nothing");
    }

    #[test]
    fn single_reference_keeps_type() {
        let vars = store();
        assert_eq!(vars.substitute(&Value::from("var(--gap)")), Value::from(8));
        assert_eq!(
            vars.substitute(&Value::from(" var(--brand) ")),
            Value::from("#336699")
        );
    }

    #[test]
    fn references_inside_text_are_replaced() {
        let vars = store();
        assert_eq!(
            vars.substitute(&Value::from("calc(var(--gap) * 2px)")),
            Value::from("calc(8 * 2px)")
        );
        assert_eq!(
            vars.substitute(&Value::from("var(--border)")),
            Value::from("1px solid #336699")
        );
    }

    #[test]
    fn missing_reference_uses_fallback() {
        let vars = store();
        assert_eq!(
            vars.substitute(&Value::from("var(--nope, rgb(0, 0, 0))")),
            Value::from("rgb(0, 0, 0)")
        );
        assert_eq!(vars.substitute(&Value::from("var(--nope)")), Value::from(""));
        assert_eq!(
            vars.substitute(&Value::from("var(--nope, var(--gap))")),
            Value::from("8")
        );
    }

    #[test]
    fn cycles_resolve_to_fallback() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut vars = VariableStore::new();
        vars.set("--a", "var(--b)").unwrap();
        vars.set("--b", "var(--a, red)").unwrap();
        assert_eq!(vars.substitute(&Value::from("var(--a)")), Value::from("red"));
    }

    #[test]
    fn unclosed_call_is_left_alone() {
        let vars = store();
        assert_eq!(
            vars.substitute(&Value::from("var(--gap")),
            Value::from("var(--gap")
        );
        assert_eq!(vars.substitute(&Value::from(3)), Value::from(3));
    }

    #[test]
    fn error_message_names_the_key() {
        let err = VariableError::InvalidName("gap".to_owned());
        assert!(err.to_string().contains("`gap`"));
    }
}
