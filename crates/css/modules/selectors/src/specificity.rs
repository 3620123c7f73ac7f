//! Selector weights.
//!
//! A base class name counts 1, `*` counts 0. Each `.class`, attribute,
//! structural pseudo-class and `:nth-child` adds 1. `:not(x)` adds only the
//! weight of `x`; `:has(x)` and the fused forms add `1 + weight(x)`.

use crate::Fragment;
use core::ops::Add;
use css_syntax::UNIVERSAL;

/// Cumulative selector weight. Higher wins; equal weights fall back to
/// source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32);

impl Specificity {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
}

impl Add for Specificity {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// Weight contributed by a single fragment.
pub fn specificity_of_fragment(fragment: &Fragment) -> Specificity {
    match fragment {
        Fragment::Class(_)
        | Fragment::Attribute(_)
        | Fragment::Structural(_)
        | Fragment::NthChild(_) => Specificity::ONE,
        Fragment::Not(inner) => inner.weight,
        Fragment::Has(inner) | Fragment::HasNone(inner) => Specificity::ONE + inner.weight,
    }
}

/// Total weight of a base class plus its fragments.
pub fn specificity_of(base_class_name: &str, fragments: &[Fragment]) -> Specificity {
    let base = if base_class_name == UNIVERSAL {
        Specificity::ZERO
    } else {
        Specificity::ONE
    };
    fragments
        .iter()
        .fold(base, |total, fragment| total + specificity_of_fragment(fragment))
}
