//! Minimal observable state: `get`, `subscribe`, `update`.
//!
//! Listeners run synchronously after every update, outside the store lock, and
//! receive the full new value. Async consumers (such as the Dioxus hook) use
//! [`Store::watch`] instead of a callback.
//!
//! The watch channel is written while the value lock is held, so it always ends
//! on the same value as [`Store::get`] even when updates race across threads.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::sync::watch;

use crate::types::StoreValueBounds;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: BTreeMap<u64, Listener<T>>,
}

/// A value with change notification
pub struct Store<T> {
    value: Arc<Mutex<T>>,
    listeners: Arc<Mutex<Listeners<T>>>,
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            listeners: self.listeners.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<T: StoreValueBounds> Store<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _receiver) = watch::channel(initial.clone());
        Self {
            value: Arc::new(Mutex::new(initial)),
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: BTreeMap::new(),
            })),
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Mutate the value in place and notify subscribers. Returns what `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
            let result = f(&mut value);
            self.sender.send_replace(value.clone());
            (result, value.clone())
        };
        self.notify_listeners(&snapshot);
        result
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, next: T) {
        self.update(|value| *value = next);
    }

    /// Register a listener called with the new value after every change.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .entries
                        .remove(&id);
                }
            })),
        }
    }

    /// Receiver that observes every value set after this call
    pub fn watch(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// True if both handles share the same underlying value
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    fn notify_listeners(&self, snapshot: &T) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Handle returned by [`Store::subscribe`]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Stop receiving updates
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Keep the listener registered for the lifetime of the store
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
