//! Transactions: deferred, coalesced notification.
//!
//! While a transaction is open on a thread, cell writes on that thread queue
//! their dependents instead of invoking them. Each dependent is queued at
//! most once, and the queue is flushed when the outermost transaction
//! returns, so dependents only ever see the final values.

use std::cell::RefCell;
use std::mem;

use hashbrown::HashSet;

use crate::subscription::{Callback, SubscriptionId};

#[derive(Default)]
struct Batch {
    depth: usize,
    pending: Vec<Callback>,
    queued: HashSet<SubscriptionId>,
}

thread_local! {
    static BATCH: RefCell<Batch> = RefCell::new(Batch::default());
}

/// Runs `f` inside a transaction and returns its result.
///
/// Transactions nest; only the outermost one flushes. If `f` panics the
/// queued notifications of the outermost transaction are discarded.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tally_reactive::{observe, transaction, Cell};
///
/// let cell = Cell::new(0);
/// let calls = Arc::new(AtomicUsize::new(0));
/// let seen = Arc::clone(&calls);
/// let _obs = observe(&cell, move |_| {
///     seen.fetch_add(1, Ordering::SeqCst);
/// });
///
/// transaction(|| {
///     cell.set(1);
///     cell.set(2);
/// });
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub fn transaction<R>(f: impl FnOnce() -> R) -> R {
    let scope = Scope::enter();
    let out = f();
    for callback in scope.leave() {
        callback();
    }
    out
}

/// Returns true if a transaction is open on the current thread.
pub fn in_transaction() -> bool {
    BATCH.with(|b| b.borrow().depth > 0)
}

/// Invokes `callback` now, or queues it if a transaction is open.
pub(crate) fn dispatch(id: SubscriptionId, callback: Callback) {
    let immediate = BATCH.with(|b| {
        let mut batch = b.borrow_mut();
        if batch.depth == 0 {
            return Some(callback);
        }
        if batch.queued.insert(id) {
            batch.pending.push(callback);
        }
        None
    });
    if let Some(callback) = immediate {
        callback();
    }
}

/// One level of transaction nesting.
struct Scope {
    armed: bool,
}

impl Scope {
    fn enter() -> Self {
        BATCH.with(|b| b.borrow_mut().depth += 1);
        Self { armed: true }
    }

    /// Closes this level and returns the queue if it was the outermost.
    fn leave(mut self) -> Vec<Callback> {
        self.armed = false;
        BATCH.with(|b| {
            let mut batch = b.borrow_mut();
            batch.depth -= 1;
            if batch.depth > 0 {
                return Vec::new();
            }
            batch.queued.clear();
            mem::take(&mut batch.pending)
        })
    }
}

impl Drop for Scope {
    // Only reached without `leave` when `f` unwinds.
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let _ = BATCH.try_with(|b| {
            let mut batch = b.borrow_mut();
            batch.depth -= 1;
            if batch.depth == 0 {
                batch.pending.clear();
                batch.queued.clear();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let cb: Callback = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, cb)
    }

    #[test]
    fn test_dispatch_outside_transaction_is_immediate() {
        let (count, cb) = counter();
        dispatch(1, cb);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!in_transaction());
    }

    #[test]
    fn test_dispatch_coalesces_by_id() {
        let (count, cb) = counter();
        transaction(|| {
            assert!(in_transaction());
            dispatch(7, Arc::clone(&cb));
            dispatch(7, Arc::clone(&cb));
            dispatch(7, cb);
            assert_eq!(count.load(Ordering::SeqCst), 0);
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_transaction_flushes_once_at_outermost() {
        let (count, cb) = counter();
        transaction(|| {
            transaction(|| dispatch(3, Arc::clone(&cb)));
            assert_eq!(count.load(Ordering::SeqCst), 0);
            dispatch(3, cb);
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transaction_returns_value() {
        assert_eq!(transaction(|| 42), 42);
    }

    #[test]
    fn test_panic_discards_pending() {
        let (count, cb) = counter();
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            transaction(|| {
                dispatch(9, cb);
                panic!("boom");
            })
        }));
        assert!(result.is_err());
        assert!(!in_transaction());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // The thread's batch is usable again.
        let (count, cb) = counter();
        transaction(|| dispatch(9, cb));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
