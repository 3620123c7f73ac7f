//! Scope generations for memo invalidation.
//!
//! Every registration bumps a process-wide counter and stamps the scope it
//! touched. A resolver keys its memo by the generations of the scopes it
//! reads, so a result computed before a registration is never served after
//! it, even when the change event was missed.

use core::sync::atomic::{AtomicU64, Ordering};

/// A point in the registration history. Higher is more recent.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Generation(u64);

impl Generation {
    /// Before any registration.
    pub const INITIAL: Self = Self(0);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_newer_than(self, other: Self) -> bool {
        self.0 > other.0
    }
}

/// Atomic generation counter shared by every scope of a store.
#[derive(Debug)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    #[inline]
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(Generation::INITIAL.0),
        }
    }

    #[inline]
    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    /// Advance and return the new generation.
    #[inline]
    pub fn increment(&self) -> Generation {
        let previous = self.current.fetch_add(1, Ordering::AcqRel);
        Generation(previous.saturating_add(1))
    }
}

impl Default for GenerationCounter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Generations of the scopes a resolver reads: the global scope and,
/// optionally, one local scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ScopeGeneration {
    pub global: Generation,
    pub local: Option<Generation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), Generation::INITIAL);
        let first = counter.increment();
        let second = counter.increment();
        assert!(second.is_newer_than(first));
        assert_eq!(counter.current(), second);
        assert_eq!(second.get(), 2);
    }

    #[test]
    fn scope_generation_tracks_both_parts() {
        let before = ScopeGeneration {
            global: Generation(1),
            local: Some(Generation(2)),
        };
        let after = ScopeGeneration {
            local: Some(Generation(3)),
            ..before
        };
        assert_ne!(before, after);
    }
}
