//! Selector normalization: `&` parent references and descendant sugar.
//!
//! Two rewrites turn a user definition into the plain nested form the rule
//! extractor walks:
//! - `&` inside a key is replaced by the enclosing key, and the rewritten
//!   entry moves up to sit next to that enclosing key.
//! - A key made of whitespace-separated selectors (`"list item"`) becomes a
//!   chain of nested maps (`{ list: { item: .. } }`), deep merged into any
//!   existing entry for the first selector.
//!
//! Text inside `[...]`, `(...)` and quotes is left alone by both rewrites.

use crate::{StyleMap, StyleValue};
use core::mem::take;
use log::warn;

/// Entries produced while normalizing one nesting level.
type Entries = Vec<(String, StyleValue)>;

/// Normalize a style definition.
pub fn normalize(source: &StyleMap) -> StyleMap {
    let (level, hoisted) = normalize_level(source, None);
    let mut out = StyleMap::new();
    for (key, value) in level.into_iter().chain(hoisted) {
        place(&mut out, &key, value);
    }
    out
}

/// Normalize one level. Returns the entries that stay on this level and the
/// entries that move up to the parent's level.
fn normalize_level(source: &StyleMap, parent_key: Option<&str>) -> (Entries, Entries) {
    let mut here = Entries::new();
    let mut up = Entries::new();
    for (key, value) in source {
        if value.is_primitive() {
            here.push((key.clone(), value.clone()));
            continue;
        }
        let (resolved, hoist) = if has_parent_reference(key) {
            if let Some(parent) = parent_key {
                (substitute_parent(key, parent), true)
            } else {
                warn!("`&` in selector `{key}` has no enclosing selector; left unexpanded");
                (key.clone(), false)
            }
        } else {
            (key.clone(), false)
        };
        let destination = if hoist { &mut up } else { &mut here };
        match value {
            StyleValue::Nested(children) => {
                let (inner, inner_up) = normalize_level(children, Some(&resolved));
                let mut nested = StyleMap::new();
                for (child_key, child_value) in inner {
                    place(&mut nested, &child_key, child_value);
                }
                destination.push((resolved, StyleValue::Nested(nested)));
                destination.extend(inner_up);
            }
            other => destination.push((resolved, other.clone())),
        }
    }
    (here, up)
}

/// Insert an entry, expanding descendant sugar and merging nested maps.
fn place(target: &mut StyleMap, key: &str, value: StyleValue) {
    if value.is_primitive() {
        target.insert(key, value);
        return;
    }
    let segments = split_descendants(key);
    let Some((first, rest)) = segments.split_first() else {
        target.merge_entry(key, value);
        return;
    };
    let nested = rest.iter().rev().fold(value, |inner, segment| {
        let mut level = StyleMap::new();
        level.merge_entry(segment, inner);
        StyleValue::Nested(level)
    });
    target.merge_entry(first, nested);
}

/// Tracks whether the scanner is inside brackets, parentheses or quotes.
#[derive(Default)]
struct Guard {
    /// Open `[` / `(` count.
    depth: usize,
    /// Active quote character, if any.
    quote: Option<char>,
}

impl Guard {
    /// Feed one character; returns true when it sits at top level.
    fn step(&mut self, ch: char) -> bool {
        if let Some(open) = self.quote {
            if ch == open {
                self.quote = None;
            }
            return false;
        }
        match ch {
            '"' | '\'' => {
                self.quote = Some(ch);
                false
            }
            '[' | '(' => {
                self.depth = self.depth.saturating_add(1);
                false
            }
            ']' | ')' => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// True if `key` contains a top-level `&`.
fn has_parent_reference(key: &str) -> bool {
    let mut guard = Guard::default();
    key.chars().any(|ch| guard.step(ch) && ch == '&')
}

/// Replace every top-level `&` in `key` with `parent`.
fn substitute_parent(key: &str, parent: &str) -> String {
    let mut guard = Guard::default();
    let mut out = String::with_capacity(key.len().saturating_add(parent.len()));
    for ch in key.chars() {
        if guard.step(ch) && ch == '&' {
            out.push_str(parent);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split `key` on top-level whitespace.
fn split_descendants(key: &str) -> Vec<String> {
    let mut guard = Guard::default();
    let mut segments = Vec::new();
    let mut current = String::new();
    for ch in key.chars() {
        if guard.step(ch) && ch.is_whitespace() {
            if !current.is_empty() {
                segments.push(take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Declaration;

    fn keys(map: &StyleMap) -> Vec<&str> {
        map.iter().map(|(key, _)| key.as_str()).collect()
    }

    fn nested<'map>(map: &'map StyleMap, key: &str) -> &'map StyleMap {
        match map.get(key) {
            Some(StyleValue::Nested(inner)) => inner,
            other => panic!("expected nested map under `{key}`, got {other:?}"),
        }
    }

    #[test]
    fn descendant_keys_become_nested() {
        let source = StyleMap::new().with("a b c", StyleMap::new().with("color", "red"));
        let out = normalize(&source);
        let level_b = nested(&out, "a");
        let level_c = nested(level_b, "b");
        assert_eq!(keys(nested(level_c, "c")), vec!["color"]);
    }

    #[test]
    fn descendant_sugar_merges_into_existing_entry() {
        let source = StyleMap::new()
            .with("list", StyleMap::new().with("margin", 0))
            .with("list item", StyleMap::new().with("color", "red"));
        let out = normalize(&source);
        assert_eq!(keys(&out), vec!["list"]);
        assert_eq!(keys(nested(&out, "list")), vec!["margin", "item"]);
    }

    #[test]
    fn ampersand_moves_to_parent_level() {
        let source = StyleMap::new().with(
            "item",
            StyleMap::new()
                .with("color", "gray")
                .with("&:first-child", StyleMap::new().with("color", "blue")),
        );
        let out = normalize(&source);
        assert_eq!(keys(&out), vec!["item", "item:first-child"]);
        assert_eq!(keys(nested(&out, "item")), vec!["color"]);
    }

    #[test]
    fn ampersand_attribute_refines_parent_at_its_level() {
        let source = StyleMap::new().with(
            "item",
            StyleMap::new()
                .with("color", "gray")
                .with("&[data-x=\"1\"]", StyleMap::new().with("color", "red"))
                .with("&[title='a b']", StyleMap::new().with("color", "blue")),
        );
        let out = normalize(&source);
        assert_eq!(
            keys(&out),
            vec!["item", "item[data-x=\"1\"]", "item[title='a b']"]
        );
        assert_eq!(keys(nested(&out, "item[data-x=\"1\"]")), vec!["color"]);
        assert_eq!(keys(nested(&out, "item")), vec!["color"]);
    }

    #[test]
    fn ampersand_inside_nested_level_stays_below_grandparent() {
        let source = StyleMap::new().with(
            "list",
            StyleMap::new().with(
                "item",
                StyleMap::new().with("&-active", Declaration::new().with("color", "red")),
            ),
        );
        let out = normalize(&source);
        assert_eq!(keys(nested(&out, "list")), vec!["item", "item-active"]);
    }

    #[test]
    fn brackets_protect_spaces_and_ampersands() {
        let source = StyleMap::new().with(
            "item[title='a & b c']",
            StyleMap::new().with("color", "red"),
        );
        let out = normalize(&source);
        assert_eq!(keys(&out), vec!["item[title='a & b c']"]);
    }

    #[test]
    fn rootless_ampersand_stays_in_place() {
        let _ = env_logger::builder().is_test(true).try_init();
        let source = StyleMap::new().with("&:hover", StyleMap::new().with("color", "red"));
        let out = normalize(&source);
        assert_eq!(keys(&out), vec!["&:hover"]);
    }

    #[test]
    fn rewritten_key_with_spaces_is_expanded() {
        let source = StyleMap::new().with(
            "card",
            StyleMap::new().with("& title", StyleMap::new().with("weight", 700)),
        );
        let out = normalize(&source);
        assert_eq!(keys(&out), vec!["card"]);
        assert_eq!(keys(nested(nested(&out, "card"), "title")), vec!["weight"]);
    }
}
