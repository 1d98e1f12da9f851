//! Records and their monitors.

use std::sync::Arc;

use parking_lot::Mutex;
use tally_core::{Field, RecordId, Snapshot};
use tally_reactive::Cell;

/// Record storage backend: HashMap or id-ordered BTreeMap.
#[cfg(feature = "hash-store")]
pub(crate) type RecordMap<E1, E2, K> = hashbrown::HashMap<RecordId, Arc<Record<E1, E2, K>>>;
#[cfg(not(feature = "hash-store"))]
pub(crate) type RecordMap<E1, E2, K> = std::collections::BTreeMap<RecordId, Arc<Record<E1, E2, K>>>;

/// Reconciliation state of one record.
///
/// `last` is the snapshot the totals and the ordered index currently account
/// for. Only the monitor's holder writes it.
pub(crate) struct Monitor<E1, E2> {
    pub(crate) last: Snapshot<E1, E2>,
    pub(crate) active: bool,
}

/// One live entry of a collection.
pub(crate) struct Record<E1, E2, K> {
    pub(crate) id: RecordId,
    pub(crate) key: Option<K>,
    pub(crate) field1: Cell<E1>,
    pub(crate) field2: Cell<E2>,
    pub(crate) monitor: Mutex<Monitor<E1, E2>>,
}

impl<E1: Field, E2: Field, K: Clone> Record<E1, E2, K> {
    pub(crate) fn new(id: RecordId, key: Option<K>, field1: E1, field2: E2) -> Self {
        let last = Snapshot::new(field1.clone(), field2.clone());
        Self {
            id,
            key,
            field1: Cell::new(field1),
            field2: Cell::new(field2),
            monitor: Mutex::new(Monitor { last, active: true }),
        }
    }

    /// Reads both cells.
    pub(crate) fn current(&self) -> Snapshot<E1, E2> {
        Snapshot::new(self.field1.get(), self.field2.get())
    }

    pub(crate) fn view(&self) -> RecordView<E1, E2, K> {
        RecordView {
            id: self.id,
            field1: self.field1.get(),
            field2: self.field2.get(),
            key: self.key.clone(),
        }
    }
}

/// A point-in-time copy of one record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordView<E1, E2, K = ()> {
    pub id: RecordId,
    pub field1: E1,
    pub field2: E2,
    pub key: Option<K>,
}

impl<E1: Clone, E2: Clone, K> RecordView<E1, E2, K> {
    /// Returns both fields as a snapshot.
    pub fn snapshot(&self) -> Snapshot<E1, E2> {
        Snapshot::new(self.field1.clone(), self.field2.clone())
    }
}
