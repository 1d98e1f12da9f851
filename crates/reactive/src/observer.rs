//! Observers: callbacks attached to one or two cells.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cell::Cell;
use crate::subscription::{next_subscription_id, Callback, SubscriptionId};

type Detach = Box<dyn FnOnce() + Send + Sync>;

/// Handle to an attached callback.
///
/// The callback stays attached until `close` is called or the handle is
/// dropped.
#[must_use = "dropping an Observer detaches its callback"]
pub struct Observer {
    id: SubscriptionId,
    alive: Arc<AtomicBool>,
    detach: Vec<Detach>,
}

impl Observer {
    /// Returns the subscription id shared by every cell this observer watches.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns false once the observer has been closed.
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Permanently detaches the callback. Idempotent.
    ///
    /// A notification already queued by an open transaction is dropped.
    pub fn close(&mut self) {
        self.alive.store(false, Ordering::Release);
        for detach in self.detach.drain(..) {
            detach();
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

fn detacher<T: Clone + Send + Sync + 'static>(cell: &Cell<T>, id: SubscriptionId) -> Detach {
    let weak = cell.downgrade();
    Box::new(move || {
        if let Some(cell) = weak.upgrade() {
            cell.detach(id);
        }
    })
}

/// Calls `f` with the cell's value whenever the cell changes.
pub fn observe<T, F>(cell: &Cell<T>, f: F) -> Observer
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let id = next_subscription_id();
    let alive = Arc::new(AtomicBool::new(true));

    let weak = cell.downgrade();
    let gate = Arc::clone(&alive);
    let callback: Callback = Arc::new(move || {
        if !gate.load(Ordering::Acquire) {
            return;
        }
        if let Some(cell) = weak.upgrade() {
            f(cell.get());
        }
    });
    cell.attach(id, callback);

    Observer {
        id,
        alive,
        detach: vec![detacher(cell, id)],
    }
}

/// Calls `f` with both values whenever either cell changes.
///
/// Within one transaction `f` runs at most once even if both cells change.
pub fn observe2<A, B, F>(a: &Cell<A>, b: &Cell<B>, f: F) -> Observer
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    F: Fn(A, B) + Send + Sync + 'static,
{
    let id = next_subscription_id();
    let alive = Arc::new(AtomicBool::new(true));

    let (weak_a, weak_b) = (a.downgrade(), b.downgrade());
    let gate = Arc::clone(&alive);
    let callback: Callback = Arc::new(move || {
        if !gate.load(Ordering::Acquire) {
            return;
        }
        if let (Some(a), Some(b)) = (weak_a.upgrade(), weak_b.upgrade()) {
            f(a.get(), b.get());
        }
    });
    a.attach(id, Arc::clone(&callback));
    b.attach(id, callback);

    Observer {
        id,
        alive,
        detach: vec![detacher(a, id), detacher(b, id)],
    }
}
