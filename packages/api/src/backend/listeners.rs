//! Session observer registry shared by the backend implementations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::SessionHandle;

/// Callback invoked with the ambient session (`None` when signed out).
pub type SessionListener = Box<dyn Fn(Option<SessionHandle>) + Send + Sync>;

type SharedListener = Arc<dyn Fn(Option<SessionHandle>) + Send + Sync>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, SharedListener)>,
}

/// Set of registered session listeners.
#[derive(Clone, Default)]
pub struct SessionListeners {
    table: Arc<Mutex<ListenerTable>>,
}

fn lock(table: &Mutex<ListenerTable>) -> MutexGuard<'_, ListenerTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` and deliver `current` to it immediately.
    pub fn subscribe(&self, listener: SessionListener, current: Option<SessionHandle>) -> Subscription {
        let listener: SharedListener = Arc::from(listener);
        let id = {
            let mut table = lock(&self.table);
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push((id, listener.clone()));
            id
        };
        listener(current);
        Subscription {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Deliver `handle` to every listener. Listeners run outside the lock so
    /// they may subscribe or unsubscribe.
    pub fn notify(&self, handle: Option<SessionHandle>) {
        let listeners: Vec<SharedListener> = lock(&self.table)
            .entries
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(handle.clone());
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.table).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration handle; dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    table: Weak<Mutex<ListenerTable>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            lock(&table).entries.retain(|(id, _)| *id != self.id);
        }
    }
}
