//! Change notification.
//!
//! Subscribers are plain callbacks with no arguments: "something changed,
//! re-query if you care". Callbacks run synchronously on the thread that
//! ingested the document, once per accepted document.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// The subscriber list owned by one store.
///
/// Clones share the list, so every handle onto the same store notifies the
/// same subscribers.
#[derive(Clone, Default)]
pub struct ChangeEmitter {
    inner: Arc<Mutex<Subscribers>>,
}

impl ChangeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Keep the returned handle to remove it later.
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut subs = self.inner.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.callbacks.push((id, Arc::new(callback)));
        Unsubscribe {
            id,
            subscribers: Arc::downgrade(&self.inner),
        }
    }

    /// Call every subscriber.
    ///
    /// Works on a snapshot taken before the first call, with the lock
    /// released, so a callback may subscribe or unsubscribe freely. Changes
    /// it makes take effect from the next `emit`.
    pub fn emit(&self) {
        let snapshot: Vec<Callback> = self
            .inner
            .lock()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in snapshot {
            callback();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl fmt::Debug for ChangeEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEmitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`ChangeEmitter::subscribe`].
///
/// Dropping it does *not* unsubscribe; call [`unsubscribe`](Self::unsubscribe).
/// Holds only a weak reference, so it never keeps a store's subscriber list
/// alive, and unsubscribing after the store is gone does nothing.
#[must_use = "dropping the handle keeps the callback subscribed forever"]
pub struct Unsubscribe {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers
                .lock()
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsubscribe({})", self.id)
    }
}
