//! Ordered listener registries with idempotent unsubscription.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Handle returned by every `subscribe`-style call.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it. Unsubscribing twice is a
/// no-op.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    pub fn unsubscribe(&self) {
        (self.cancel)()
    }
}

struct Entries<L: ?Sized> {
    next_id: u64,
    listeners: Vec<(u64, Arc<L>)>,
}

/// Listeners kept in subscription order.
pub(crate) struct ListenerSet<L: ?Sized> {
    entries: Arc<Mutex<Entries<L>>>,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerSet<L> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) -> Subscription {
        let id = {
            let mut entries = self.entries.lock();
            let id = entries.next_id;
            entries.next_id += 1;
            entries.listeners.push((id, listener));
            id
        };

        let entries: Weak<Mutex<Entries<L>>> = Arc::downgrade(&self.entries);
        Subscription::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.lock().listeners.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Calls `f` for each listener, in subscription order.
    ///
    /// The lock is released while listeners run, so they may subscribe or
    /// unsubscribe. A listener removed during the pass is skipped.
    pub(crate) fn for_each_live(&self, mut f: impl FnMut(&L)) {
        let snapshot: Vec<(u64, Arc<L>)> = self.entries.lock().listeners.clone();
        for (id, listener) in snapshot {
            if self.contains(id) {
                f(&listener);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.lock().listeners.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().listeners.clear();
    }

    fn contains(&self, id: u64) -> bool {
        self.entries
            .lock()
            .listeners
            .iter()
            .any(|(entry_id, _)| *entry_id == id)
    }
}
