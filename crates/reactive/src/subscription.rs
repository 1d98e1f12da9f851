//! Subscription management for reactive cells.
//!
//! This module provides subscription IDs and a manager for tracking the
//! callbacks attached to a single cell.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;

/// Unique identifier for a subscription.
///
/// Ids are process-wide so one observer watching several cells keeps the
/// same id on each of them.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh subscription id.
pub fn next_subscription_id() -> SubscriptionId {
    NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Manages the subscriptions of one cell.
#[derive(Default)]
pub struct SubscriptionManager {
    subscriptions: HashMap<SubscriptionId, Callback>,
}

impl SubscriptionManager {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes under an id allocated by the caller.
    pub fn subscribe_with_id(&mut self, id: SubscriptionId, callback: Callback) {
        self.subscriptions.insert(id, callback);
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Returns the attached callbacks, cloned so they can be invoked after
    /// the manager's lock is released.
    pub fn callbacks(&self) -> Vec<(SubscriptionId, Callback)> {
        self.subscriptions
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect()
    }

    /// Returns the number of subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
}
