//! Auth-change subscriptions.

use std::sync::{Arc, Mutex};

use entities::{AuthEvent, Session};

/// Callback invoked on auth state changes.
pub type AuthListener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

pub(crate) struct ListenerEntry {
    pub(crate) id: u64,
    pub(crate) listener: AuthListener,
}

pub(crate) type ListenerRegistry = Arc<Mutex<Vec<ListenerEntry>>>;

/// Handle returned by [`crate::IdentityStore::subscribe`].
///
/// Dropping the handle leaves the listener attached; call
/// [`AuthSubscription::unsubscribe`] to detach it.
pub struct AuthSubscription {
    id: u64,
    registry: ListenerRegistry,
}

impl AuthSubscription {
    pub(crate) fn new(id: u64, registry: ListenerRegistry) -> Self {
        Self { id, registry }
    }

    /// Detaches this listener. Other subscriptions are unaffected.
    pub fn unsubscribe(self) {
        let mut listeners = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|entry| entry.id != self.id);
    }
}
