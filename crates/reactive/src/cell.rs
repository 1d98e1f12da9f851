//! Reactive cells.
//!
//! A `Cell<T>` is a cloneable shared handle to one value. Writes notify the
//! cell's subscribers synchronously on the writing thread, or at the close of
//! the thread's open transaction.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::subscription::{Callback, SubscriptionId, SubscriptionManager};
use crate::transaction::dispatch;

struct Shared<T> {
    value: RwLock<T>,
    subscribers: Mutex<SubscriptionManager>,
}

/// A shared, observable value.
pub struct Cell<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Cell<T> {
    /// Creates a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Shared {
                value: RwLock::new(initial),
                subscribers: Mutex::new(SubscriptionManager::new()),
            }),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.write() = value;
        self.notify();
    }

    /// Atomically modifies the value in place.
    ///
    /// `f` runs under the cell's write lock and returns whether it changed
    /// the value; subscribers are notified only if it did. Returns that flag.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = {
            let mut value = self.inner.value.write();
            f(&mut value)
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Returns the number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Returns true if both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn attach(&self, id: SubscriptionId, callback: Callback) {
        self.inner.subscribers.lock().subscribe_with_id(id, callback);
    }

    pub(crate) fn detach(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.lock().unsubscribe(id)
    }

    pub(crate) fn downgrade(&self) -> WeakCell<T> {
        WeakCell {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn notify(&self) {
        // Callbacks run with no cell lock held so they may read or write cells.
        let callbacks = self.inner.subscribers.lock().callbacks();
        for (id, callback) in callbacks {
            dispatch(id, callback);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&*self.inner.value.read()).finish()
    }
}

/// A non-owning handle held by observer callbacks.
pub(crate) struct WeakCell<T> {
    inner: Weak<Shared<T>>,
}

impl<T> WeakCell<T> {
    pub(crate) fn upgrade(&self) -> Option<Cell<T>> {
        self.inner.upgrade().map(|inner| Cell { inner })
    }
}
