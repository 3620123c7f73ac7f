//! `:nth-child(..)` expressions.
//!
//! Accepted forms, whitespace ignored:
//! - `N`: the node at position `N`
//! - `kn`: every `k`-th node (`n` alone means `k = 1`)
//! - `kn+m`: nodes whose position modulo `k` equals `m`
//! - `kn-m`: nodes whose position modulo `k` plus `m` is zero
//! - `odd` / `even`
//!
//! A step of zero never matches.

/// Parsed `:nth-child` argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NthExpr {
    /// `N`
    Exact(usize),
    /// `kn`
    Every { step: usize },
    /// `kn+m` (`plus`) or `kn-m`.
    Offset { step: usize, offset: usize, plus: bool },
}

impl NthExpr {
    /// Parse an expression; `None` if it is not one of the accepted forms.
    pub fn parse(text: &str) -> Option<Self> {
        let compact: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();
        match compact.as_str() {
            "odd" => {
                return Some(Self::Offset {
                    step: 2,
                    offset: 1,
                    plus: true,
                });
            }
            "even" => return Some(Self::Every { step: 2 }),
            _ => {}
        }
        if let Some(exact) = parse_digits(&compact) {
            return Some(Self::Exact(exact));
        }
        let (coefficient, tail) = compact.split_once('n')?;
        let step = if coefficient.is_empty() {
            1
        } else {
            parse_digits(coefficient)?
        };
        if tail.is_empty() {
            return Some(Self::Every { step });
        }
        let (plus, digits) = if let Some(rest) = tail.strip_prefix('+') {
            (true, rest)
        } else {
            (false, tail.strip_prefix('-')?)
        };
        let offset = parse_digits(digits)?;
        Some(Self::Offset { step, offset, plus })
    }

    /// Test a 1-based position.
    pub const fn matches(self, index: usize) -> bool {
        match self {
            Self::Exact(position) => index == position,
            Self::Every { step } => step != 0 && index % step == 0,
            Self::Offset { step, offset, plus } => {
                if step == 0 {
                    return false;
                }
                let rem = index % step;
                if plus {
                    rem == offset
                } else {
                    rem.saturating_add(offset) == 0
                }
            }
        }
    }
}

/// Parse a non-empty run of ASCII digits.
fn parse_digits(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
