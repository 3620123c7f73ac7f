//! Invalidation bus: tells resolvers that a scope's rules changed.

use core::sync::atomic::{AtomicU64, Ordering};
use log::trace;
use parking_lot::Mutex;
use std::sync::Arc;

/// A scope registration that invalidates memoized results.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeEvent {
    /// The global scope was rebuilt; every resolver is affected.
    GlobalChanged,
    /// The named local scope gained rules.
    LocalChanged(String),
}

impl ScopeEvent {
    /// Whether a resolver bound to `scope` (or to no local scope) must drop
    /// its memo.
    pub fn affects(&self, scope: Option<&str>) -> bool {
        match self {
            Self::GlobalChanged => true,
            Self::LocalChanged(name) => scope.is_some_and(|bound| bound == name),
        }
    }
}

/// Handle returned by [`InvalidationBus::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ScopeEvent) + Send + Sync>;

struct ListenerEntry {
    id: ListenerId,
    /// Removed before its first delivery.
    once: bool,
    callback: Listener,
}

/// Synchronous broadcast of [`ScopeEvent`]s.
///
/// Listeners run on the publishing thread after the listener list lock is
/// released, so a listener may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct InvalidationBus {
    listeners: Mutex<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl InvalidationBus {
    /// Bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every future event.
    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ScopeEvent) + Send + Sync + 'static,
    {
        self.register(Arc::new(callback), false)
    }

    /// Register a listener for the next event only.
    pub fn subscribe_once<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ScopeEvent) + Send + Sync + 'static,
    {
        self.register(Arc::new(callback), true)
    }

    fn register(&self, callback: Listener, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push(ListenerEntry { id, once, callback });
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener registered before the call.
    pub fn publish(&self, event: &ScopeEvent) {
        let snapshot: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let snapshot = listeners
                .iter()
                .map(|entry| Arc::clone(&entry.callback))
                .collect();
            listeners.retain(|entry| !entry.once);
            snapshot
        };
        trace!("publishing {event:?} to {} listeners", snapshot.len());
        for callback in snapshot {
            callback(event);
        }
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Number of registered listeners, once listeners included.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}
