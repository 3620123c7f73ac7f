//! Scope store, invalidation bus and memoized cascade resolution.
//!
//! [`ScopeStore`] owns the global scope, the named local scopes and the
//! custom property store. Registering a scope bumps its [`Generation`] and
//! publishes a [`ScopeEvent`] on the store's [`InvalidationBus`]; every
//! [`CascadeResolver`] bound to the affected scope drops its memo.

mod bus;
mod generation;
mod resolver;
mod scope;

pub use bus::{InvalidationBus, ListenerId, ScopeEvent};
pub use generation::{Generation, GenerationCounter, ScopeGeneration};
pub use resolver::{CascadeResolver, DEFAULT_MEMO_CAPACITY, ResolverConfig};
pub use scope::{Scope, ScopeStore, ScopeView};
