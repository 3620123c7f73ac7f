//! Recursive-descent selector parsing.

use crate::specificity::specificity_of;
use crate::{
    AttrOperator, AttributeSelector, CompiledSelector, Fragment, NthExpr, Specificity, Structural,
    compile,
};
use css_syntax::UNIVERSAL;
use log::trace;
use std::sync::Arc;

/// Cursor over a selector key.
struct SelectorTokenizer<'src> {
    /// Selector text.
    input: &'src str,
    /// Current byte offset into `input`.
    index: usize,
}

/// Parse failure; the caller turns it into a never-matching selector.
#[derive(Debug)]
struct Malformed;

type ParseResult<T> = Result<T, Malformed>;

impl<'src> SelectorTokenizer<'src> {
    #[inline]
    const fn new(input: &'src str) -> Self {
        Self { input, index: 0 }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.index).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    /// Consume `[A-Za-z0-9_-]*`.
    fn consume_ident(&mut self) -> &'src str {
        let start = self.index;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        self.input.get(start..self.index).unwrap_or("")
    }

    /// Consume a leading `*` or class token; neither means `*`.
    fn consume_base(&mut self) -> String {
        if self.peek() == Some(b'*') {
            self.bump();
            return UNIVERSAL.to_owned();
        }
        let ident = self.consume_ident();
        if ident.is_empty() {
            UNIVERSAL.to_owned()
        } else {
            ident.to_owned()
        }
    }

    /// Consume a bracketed or parenthesised group whose opener is at the
    /// cursor and return its inner text.
    fn consume_group(&mut self) -> ParseResult<&'src str> {
        let open = self.index;
        let close = find_closing(self.input, open).ok_or(Malformed)?;
        self.index = close.saturating_add(1);
        self.input.get(open.saturating_add(1)..close).ok_or(Malformed)
    }

    fn consume_fragment(&mut self) -> ParseResult<Fragment> {
        match self.peek().ok_or(Malformed)? {
            b'.' => {
                self.bump();
                let ident = self.consume_ident();
                if ident.is_empty() {
                    return Err(Malformed);
                }
                Ok(Fragment::Class(ident.to_owned()))
            }
            b'[' => {
                let body = self.consume_group()?;
                parse_attribute(body).map(Fragment::Attribute)
            }
            b':' => {
                self.bump();
                self.consume_pseudo()
            }
            _ => Err(Malformed),
        }
    }

    fn consume_pseudo(&mut self) -> ParseResult<Fragment> {
        let name = self.consume_ident();
        match name {
            "first-child" => Ok(Fragment::Structural(Structural::FirstChild)),
            "last-child" => Ok(Fragment::Structural(Structural::LastChild)),
            "only-child" => Ok(Fragment::Structural(Structural::OnlyChild)),
            "empty" => Ok(Fragment::Structural(Structural::Empty)),
            "nth-child" => {
                let argument = self.consume_argument()?;
                NthExpr::parse(argument)
                    .map(Fragment::NthChild)
                    .ok_or(Malformed)
            }
            "not" => {
                let argument = self.consume_argument()?.trim();
                if let Some(inner) = strip_pseudo_call(argument, "has") {
                    return compile_inner(inner).map(Fragment::HasNone);
                }
                compile_inner(argument).map(Fragment::Not)
            }
            "has" => {
                let argument = self.consume_argument()?.trim();
                if let Some(inner) = strip_pseudo_call(argument, "not") {
                    return compile_inner(inner).map(Fragment::HasNone);
                }
                compile_inner(argument).map(Fragment::Has)
            }
            _ => Err(Malformed),
        }
    }

    /// Consume the `(...)` argument of a functional pseudo-class.
    fn consume_argument(&mut self) -> ParseResult<&'src str> {
        if self.peek() != Some(b'(') {
            return Err(Malformed);
        }
        self.consume_group()
    }
}

/// Find the byte offset of the bracket closing the one at `open`, skipping
/// quoted text and nested groups.
fn find_closing(input: &str, open: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut stack = vec![closer_for(*bytes.get(open)?)?];
    let mut quote: Option<u8> = None;
    let mut index = open.saturating_add(1);
    while let Some(&byte) = bytes.get(index) {
        if let Some(open_quote) = quote {
            if byte == open_quote {
                quote = None;
            }
        } else if byte == b'"' || byte == b'\'' {
            quote = Some(byte);
        } else if let Some(closer) = closer_for(byte) {
            stack.push(closer);
        } else if byte == b')' || byte == b']' {
            if stack.pop() != Some(byte) {
                return None;
            }
            if stack.is_empty() {
                return Some(index);
            }
        }
        index = index.saturating_add(1);
    }
    None
}

#[inline]
const fn closer_for(byte: u8) -> Option<u8> {
    match byte {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        _ => None,
    }
}

/// If `text` is exactly `:name(inner)`, return `inner`.
fn strip_pseudo_call<'src>(text: &'src str, name: &str) -> Option<&'src str> {
    let rest = text.strip_prefix(':')?.strip_prefix(name)?;
    if !rest.starts_with('(') {
        return None;
    }
    let open = text.len().saturating_sub(rest.len());
    let close = find_closing(text, open)?;
    if close.saturating_add(1) != text.len() {
        return None;
    }
    text.get(open.saturating_add(1)..close)
}

/// Compile a nested selector through the shared memo.
fn compile_inner(text: &str) -> ParseResult<Arc<CompiledSelector>> {
    let inner = compile(text.trim());
    if inner.malformed {
        return Err(Malformed);
    }
    Ok(inner)
}

/// Parse the inside of `[...]`.
fn parse_attribute(body: &str) -> ParseResult<AttributeSelector> {
    let body = body.trim();
    let name_end = body
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'))
        .unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);
    if name.is_empty() {
        return Err(Malformed);
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(AttributeSelector {
            name: name.to_owned(),
            operator: AttrOperator::Exists,
            value: String::new(),
        });
    }
    let (operator, value) = if let Some(value) = rest.strip_prefix("*=") {
        (AttrOperator::Contains, value)
    } else if let Some(value) = rest.strip_prefix("^=") {
        (AttrOperator::Prefix, value)
    } else if let Some(value) = rest.strip_prefix("$=") {
        (AttrOperator::Suffix, value)
    } else if let Some(value) = rest.strip_prefix('=') {
        (AttrOperator::Equals, value)
    } else {
        return Err(Malformed);
    };
    Ok(AttributeSelector {
        name: name.to_owned(),
        operator,
        value: unquote(value.trim()).to_owned(),
    })
}

/// Strip one pair of matching surrounding quotes.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Compile a selector key. Never fails: unparsable keys come back with
/// `malformed` set.
pub(crate) fn parse_selector(source: &str) -> CompiledSelector {
    let mut tokenizer = SelectorTokenizer::new(source);
    let base_class_name = tokenizer.consume_base();
    let mut fragments = Vec::new();
    let mut malformed = source.is_empty();
    while !malformed && !tokenizer.at_end() {
        match tokenizer.consume_fragment() {
            Ok(fragment) => fragments.push(fragment),
            Err(Malformed) => malformed = true,
        }
    }
    if malformed {
        trace!("selector `{source}` is malformed and will never match");
    }
    fragments.sort_by_key(Fragment::rank);
    let weight = if malformed {
        Specificity::ZERO
    } else {
        specificity_of(&base_class_name, &fragments)
    };
    CompiledSelector {
        source: source.to_owned(),
        base_class_name,
        weight,
        fragments,
        malformed,
    }
}
