//! The collection facade.
//!
//! `Collection` owns the records, the optional ordered and key indexes and
//! the aggregate engine, and routes every mutation through them.
//!
//! Locks are taken in this order, outermost first:
//!
//! 1. the coarse lock, when enabled
//! 2. the structure gate: shared for push, erase and field writes, exclusive
//!    for `clear`, `set_compare` and `rebuild_order`
//! 3. a record's monitor
//! 4. the ordered index or the key index, never both at once
//! 5. the record store, never held while acquiring 3 or 4
//! 6. the engine's locks, then cell locks
//!
//! Observers of the total cells run while engine locks are held and must not
//! mutate the collection from the notifying thread.

use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use tally_core::{AggMode, Error, Field, Key, Numeric, RecordId, Result, Snapshot, Total, FIRST_RECORD_ID};
use tally_incremental::{AggregateEngine, TotalSpec};
use tally_index::{Comparator, IndexStats, KeyIndex, OrderedIndex, SharedComparator};
use tally_reactive::{transaction, Cell};
use tracing::{debug, trace};

use crate::config::{CollectionBuilder, CollectionConfig};
use crate::field::FieldCell;
use crate::iter::Iter;
use crate::record::{Record, RecordMap, RecordView};

/// A set of two-field records with two incrementally maintained totals.
///
/// Field types `E1`, `E2`, total types `T1`, `T2` and the key type `K`
/// default to `f64`, `i64`, `i64`, `f64` and `()`.
///
/// # Example
///
/// ```rust
/// use tally_collection::Collection;
///
/// let c: Collection = Collection::new();
/// let first = c.push(1.2, 10);
/// c.push(2.5, 3);
///
/// assert_eq!(c.total1(), 13);
/// assert!((c.total2() - 19.5).abs() < 1e-9);
///
/// c.set_field1(first, 1.5);
/// assert!((c.total2() - 22.5).abs() < 1e-9);
/// ```
pub struct Collection<E1 = f64, E2 = i64, T1 = E2, T2 = f64, K = ()> {
    config: CollectionConfig,
    coarse: Option<ReentrantMutex<()>>,
    gate: RwLock<()>,
    ordered: Option<Mutex<OrderedIndex<E1, E2>>>,
    keys: Option<Mutex<KeyIndex<K>>>,
    engine: AggregateEngine<E1, E2, T1, T2>,
    records: RwLock<RecordMap<E1, E2, K>>,
    next_id: AtomicU64,
    len: AtomicUsize,
}

impl<E1, E2, T1, T2, K> Collection<E1, E2, T1, T2, K>
where
    E1: Numeric,
    E2: Numeric,
    T1: Numeric,
    T2: Numeric,
    K: Key,
{
    /// Creates an unkeyed, unordered collection with the default totals.
    pub fn new() -> Self {
        CollectionBuilder::new().build()
    }

    /// Returns a builder starting from the default totals.
    pub fn builder() -> CollectionBuilder<E1, E2, T1, T2, K> {
        CollectionBuilder::new()
    }
}

impl<E1, E2, T1, T2, K> Default for Collection<E1, E2, T1, T2, K>
where
    E1: Numeric,
    E2: Numeric,
    T1: Numeric,
    T2: Numeric,
    K: Key,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E1, E2, T1, T2, K> Collection<E1, E2, T1, T2, K>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    pub(crate) fn with_parts(
        config: CollectionConfig,
        total1: TotalSpec<E1, E2, T1>,
        total2: TotalSpec<E1, E2, T2>,
        comparator: Option<SharedComparator<Snapshot<E1, E2>>>,
    ) -> Self {
        let config = CollectionConfig {
            ordered: comparator.is_some(),
            ..config
        };
        Self {
            coarse: config.coarse_lock.then(|| ReentrantMutex::new(())),
            gate: RwLock::new(()),
            ordered: comparator.map(|cmp| Mutex::new(OrderedIndex::new(cmp))),
            keys: config.keyed.then(|| Mutex::new(KeyIndex::new())),
            engine: AggregateEngine::new(total1, total2, config.publication),
            records: RwLock::new(RecordMap::default()),
            next_id: AtomicU64::new(FIRST_RECORD_ID),
            len: AtomicUsize::new(0),
            config,
        }
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> CollectionConfig {
        self.config
    }

    /// Returns the aggregation modes of both totals.
    pub fn modes(&self) -> (AggMode, AggMode) {
        self.engine.modes()
    }

    /// Acquires the coarse lock for a sequence of calls that must not
    /// interleave with other threads. Returns `None` when the collection was
    /// built without a coarse lock.
    ///
    /// The lock is reentrant, so the holder may keep calling the collection.
    pub fn lock(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.coarse()
    }

    fn coarse(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.coarse.as_ref().map(|lock| lock.lock())
    }

    // ---- insertion ----

    /// Adds a record and returns its id.
    pub fn push(&self, field1: E1, field2: E2) -> RecordId {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        let id = self.allocate(1);
        self.install(id, None, field1, field2);
        id
    }

    /// Adds a record under `key`.
    ///
    /// Fails with `Error::NotKeyed` on an unkeyed collection and with
    /// `Error::DuplicateKey` if a live record already holds `key`.
    pub fn push_keyed(&self, field1: E1, field2: E2, key: K) -> Result<RecordId> {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        let id = self.reserve(1, std::slice::from_ref(&key))?;
        self.install(id, Some(key), field1, field2);
        Ok(id)
    }

    /// Adds several records inside one transaction, so observers of the totals
    /// see only the state after the whole batch.
    ///
    /// `keys[i]` is the key of `items[i]`; items past the end of `keys` are
    /// unkeyed. Every key is validated before anything is inserted: on error
    /// the collection is unchanged.
    pub fn push_batch(&self, items: &[(E1, E2)], keys: Option<&[K]>) -> Result<Vec<RecordId>> {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();

        let keys = keys.map_or(&[][..], |keys| &keys[..keys.len().min(items.len())]);
        let first = self.reserve(items.len(), keys)?;
        let ids: Vec<RecordId> = (first..).take(items.len()).collect();

        transaction(|| {
            for (i, (&id, (field1, field2))) in ids.iter().zip(items).enumerate() {
                self.install(id, keys.get(i).cloned(), field1.clone(), field2.clone());
            }
        });
        debug!(count = ids.len(), first, "batch pushed");
        Ok(ids)
    }

    fn allocate(&self, count: usize) -> RecordId {
        self.next_id.fetch_add(count as RecordId, Ordering::Relaxed)
    }

    /// Validates `keys`, then allocates `count` consecutive ids and binds
    /// `keys[i]` to the `i`-th. Returns the first id.
    fn reserve(&self, count: usize, keys: &[K]) -> Result<RecordId> {
        if keys.is_empty() {
            return Ok(self.allocate(count));
        }
        let index = self.keys.as_ref().ok_or(Error::NotKeyed)?;
        let mut index = index.lock();

        let mut seen = HashSet::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key) || index.contains_key(key) {
                debug!(key = ?key, "duplicate key rejected");
                return Err(Error::duplicate_key(key));
            }
        }

        let first = self.allocate(count);
        for (id, key) in (first..).zip(keys) {
            index.add(key.clone(), id).map_err(|_| Error::duplicate_key(key))?;
        }
        Ok(first)
    }

    /// Creates the record, indexes it and applies its contribution.
    ///
    /// The new record's monitor is held until the contribution is applied, so
    /// a concurrent write to the record reconciles against the initial state.
    fn install(&self, id: RecordId, key: Option<K>, field1: E1, field2: E2) {
        let record = Arc::new(Record::new(id, key, field1, field2));
        let monitor = record.monitor.lock();

        if let Some(ordered) = &self.ordered {
            ordered.lock().insert(id, monitor.last.clone());
        }
        self.records.write().insert(id, Arc::clone(&record));
        self.len.fetch_add(1, Ordering::AcqRel);

        self.engine.apply_change(None, Some(&monitor.last));
        trace!(id, "record pushed");
    }

    // ---- removal ----

    /// Removes a record. Returns false if `id` is not live.
    pub fn erase(&self, id: RecordId) -> bool {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        match self.record(id) {
            Some(record) => self.remove_record(&record),
            None => false,
        }
    }

    /// Removes the record holding `key`. Returns false if there is none.
    pub fn erase_by_key(&self, key: &K) -> bool {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        match self.find_by_key(key).and_then(|id| self.record(id)) {
            Some(record) => self.remove_record(&record),
            None => false,
        }
    }

    fn remove_record(&self, record: &Record<E1, E2, K>) -> bool {
        let mut monitor = record.monitor.lock();
        if !monitor.active {
            return false;
        }
        monitor.active = false;

        if let Some(ordered) = &self.ordered {
            ordered.lock().remove(record.id, &monitor.last);
        }
        if let (Some(keys), Some(key)) = (&self.keys, &record.key) {
            keys.lock().remove(key, Some(record.id));
        }
        self.engine.apply_change(Some(&monitor.last), None);
        drop(monitor);

        if self.records.write().remove(&record.id).is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        trace!(id = record.id, "record erased");
        true
    }

    /// Removes every record.
    ///
    /// Each record's removal is applied inside one transaction, after which
    /// the indexes and trackers are emptied and both totals return to zero.
    /// Ids are not reused afterwards.
    pub fn clear(&self) {
        let _coarse = self.coarse();
        let _gate = self.gate.write();

        let drained: Vec<Arc<Record<E1, E2, K>>> = mem::take(&mut *self.records.write()).into_values().collect();
        transaction(|| {
            for record in &drained {
                let mut monitor = record.monitor.lock();
                monitor.active = false;
                self.engine.apply_change(Some(&monitor.last), None);
            }
            if let Some(ordered) = &self.ordered {
                ordered.lock().clear();
            }
            if let Some(keys) = &self.keys {
                keys.lock().clear();
            }
            self.engine.reset();
        });
        self.len.store(0, Ordering::Release);
        debug!(removed = drained.len(), "collection cleared");
    }

    // ---- field writes ----

    /// Sets a record's first field. Returns false if `id` is not live.
    pub fn set_field1(&self, id: RecordId, value: E1) -> bool {
        self.write_field(id, move |record| record.field1.set(value))
    }

    /// Sets a record's second field. Returns false if `id` is not live.
    pub fn set_field2(&self, id: RecordId, value: E2) -> bool {
        self.write_field(id, move |record| record.field2.set(value))
    }

    /// Sets both fields of a record with a single reconciliation.
    pub fn set_fields(&self, id: RecordId, field1: E1, field2: E2) -> bool {
        self.write_field(id, move |record| {
            transaction(|| {
                record.field1.set(field1);
                record.field2.set(field2);
            })
        })
    }

    /// Returns a handle to a record's first field.
    pub fn field1_cell(&self, id: RecordId) -> Option<FieldCell<'_, E1>> {
        let record = self.record(id)?;
        let cell = record.field1.clone();
        let write = move |value: E1| self.write_record(&record, |r| r.field1.set(value));
        Some(FieldCell::new(id, cell, Box::new(write)))
    }

    /// Returns a handle to a record's second field.
    pub fn field2_cell(&self, id: RecordId) -> Option<FieldCell<'_, E2>> {
        let record = self.record(id)?;
        let cell = record.field2.clone();
        let write = move |value: E2| self.write_record(&record, |r| r.field2.set(value));
        Some(FieldCell::new(id, cell, Box::new(write)))
    }

    fn write_field(&self, id: RecordId, write: impl FnOnce(&Record<E1, E2, K>)) -> bool {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        match self.record(id) {
            Some(record) => {
                write(&record);
                self.reconcile(&record);
                true
            }
            None => false,
        }
    }

    fn write_record(&self, record: &Record<E1, E2, K>, write: impl FnOnce(&Record<E1, E2, K>)) {
        let _coarse = self.coarse();
        let _gate = self.gate.read_recursive();
        write(record);
        self.reconcile(record);
    }

    /// Brings the totals and the ordered position of `record` in line with
    /// its cells.
    ///
    /// The cells are written before the monitor is taken, so whichever writer
    /// reconciles last sees the final values and earlier ones find nothing
    /// left to do.
    fn reconcile(&self, record: &Record<E1, E2, K>) {
        let mut monitor = record.monitor.lock();
        if !monitor.active {
            return;
        }
        let current = record.current();
        if current == monitor.last {
            return;
        }

        if let Some(ordered) = &self.ordered {
            ordered.lock().reposition(record.id, &monitor.last, &current);
        }
        let last = mem::replace(&mut monitor.last, current);
        self.engine.apply_change(Some(&last), Some(&monitor.last));
    }

    // ---- lookup ----

    fn record(&self, id: RecordId) -> Option<Arc<Record<E1, E2, K>>> {
        self.records.read().get(&id).cloned()
    }

    /// Returns the records in id order, cloned out of the store.
    fn live_records(&self) -> Vec<Arc<Record<E1, E2, K>>> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        if cfg!(feature = "hash-store") {
            records.sort_unstable_by_key(|r| r.id);
        }
        records
    }

    /// Returns the id bound to `key`. Always `None` on an unkeyed collection.
    pub fn find_by_key(&self, key: &K) -> Option<RecordId> {
        let _coarse = self.coarse();
        self.keys.as_ref()?.lock().get(key)
    }

    /// Finds the record holding `key` by scanning every record.
    ///
    /// Agrees with `find_by_key` whenever no mutation is in flight.
    pub fn find_by_key_linear(&self, key: &K) -> Option<RecordId> {
        let _coarse = self.coarse();
        self.live_records()
            .into_iter()
            .find(|record| record.key.as_ref() == Some(key))
            .map(|record| record.id)
    }

    /// Returns true if `id` is live.
    pub fn contains(&self, id: RecordId) -> bool {
        let _coarse = self.coarse();
        self.records.read().contains_key(&id)
    }

    /// Returns a copy of a record.
    pub fn get(&self, id: RecordId) -> Option<RecordView<E1, E2, K>> {
        let _coarse = self.coarse();
        self.record(id).map(|record| record.view())
    }

    /// Returns the number of live records.
    pub fn size(&self) -> usize {
        let _coarse = self.coarse();
        self.len.load(Ordering::Acquire)
    }

    /// Returns true if there are no live records.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Iterates copies of every record in id order.
    pub fn iter(&self) -> Iter<E1, E2, K> {
        let _coarse = self.coarse();
        let views = self.live_records().iter().map(|record| record.view()).collect();
        Iter::new(views)
    }

    // ---- totals ----

    /// Returns the first total.
    pub fn total1(&self) -> T1 {
        let _coarse = self.coarse();
        self.engine.total1()
    }

    /// Returns the second total.
    pub fn total2(&self) -> T2 {
        let _coarse = self.coarse();
        self.engine.total2()
    }

    /// Returns both totals. Under combined-atomic publication they always
    /// reflect the same set of mutations.
    pub fn totals(&self) -> (T1, T2) {
        let _coarse = self.coarse();
        self.engine.totals()
    }

    /// Returns the first total's cell, for observation.
    pub fn total1_cell(&self) -> &Cell<T1> {
        self.engine.total1_cell()
    }

    /// Returns the second total's cell, for observation.
    pub fn total2_cell(&self) -> &Cell<T2> {
        self.engine.total2_cell()
    }

    // ---- index statistics ----

    /// Returns a snapshot of the key index's entry counters.
    pub fn key_index_stats(&self) -> Result<IndexStats> {
        let keys = self.keys.as_ref().ok_or(Error::NotKeyed)?;
        let _coarse = self.coarse();
        let stats = keys.lock().stats().clone();
        Ok(stats)
    }

    /// Returns a snapshot of the ordered index's entry counters.
    pub fn ordered_index_stats(&self) -> Result<IndexStats> {
        self.with_ordered(|index| index.stats().clone())
    }

    // ---- ordered view ----

    fn with_ordered<R>(&self, f: impl FnOnce(&OrderedIndex<E1, E2>) -> R) -> Result<R> {
        let ordered = self.ordered.as_ref().ok_or(Error::OrderingDisabled)?;
        let _coarse = self.coarse();
        let index = ordered.lock();
        Ok(f(&index))
    }

    /// Returns record ids in comparator order.
    pub fn ordered_ids(&self) -> Result<Vec<RecordId>> {
        self.with_ordered(|index| index.ids())
    }

    /// Returns record ids in reverse comparator order.
    pub fn ordered_ids_rev(&self) -> Result<Vec<RecordId>> {
        self.with_ordered(|index| index.ids_rev())
    }

    /// Iterates copies of every record in comparator order.
    ///
    /// Field values are the ones the order was computed from.
    pub fn ordered_iter(&self) -> Result<Iter<E1, E2, K>> {
        let entries: Vec<(RecordId, Snapshot<E1, E2>)> =
            self.with_ordered(|index| index.iter().map(|(id, snapshot)| (id, snapshot.clone())).collect())?;

        let _coarse = self.coarse();
        let records = self.records.read();
        let views = entries
            .into_iter()
            .map(|(id, snapshot)| {
                let (field1, field2) = snapshot.into_parts();
                RecordView {
                    id,
                    field1,
                    field2,
                    key: records.get(&id).and_then(|record| record.key.clone()),
                }
            })
            .collect();
        Ok(Iter::new(views))
    }

    /// Returns the `k` greatest records, greatest first.
    pub fn top_k(&self, k: usize) -> Result<Vec<RecordId>> {
        self.with_ordered(|index| index.top_k(k))
    }

    /// Returns the `k` least records, least first.
    pub fn bottom_k(&self, k: usize) -> Result<Vec<RecordId>> {
        self.with_ordered(|index| index.bottom_k(k))
    }

    /// Returns the records ordered between `lower` and `upper` inclusive,
    /// ascending.
    pub fn range(&self, lower: Snapshot<E1, E2>, upper: Snapshot<E1, E2>) -> Result<Vec<RecordId>> {
        self.with_ordered(|index| index.range(lower, upper))
    }

    /// Replaces the comparator and rebuilds the ordered index.
    pub fn set_compare<C>(&self, comparator: C) -> Result<()>
    where
        C: Comparator<Snapshot<E1, E2>> + Send + Sync + 'static,
    {
        self.rebuild(Some(Arc::new(comparator)))
    }

    /// Rebuilds the ordered index from scratch with the current comparator.
    pub fn rebuild_order(&self) -> Result<()> {
        self.rebuild(None)
    }

    fn rebuild(&self, comparator: Option<SharedComparator<Snapshot<E1, E2>>>) -> Result<()> {
        let ordered = self.ordered.as_ref().ok_or(Error::OrderingDisabled)?;
        let _coarse = self.coarse();
        let _gate = self.gate.write();

        let entries: Vec<(RecordId, Snapshot<E1, E2>)> = self
            .live_records()
            .iter()
            .map(|record| (record.id, record.monitor.lock().last.clone()))
            .collect();

        let mut index = ordered.lock();
        let replaced = comparator.is_some();
        let comparator = comparator.unwrap_or_else(|| Arc::clone(index.comparator()));
        index.rebuild(comparator, entries);
        debug!(entries = index.len(), replaced, "ordered index rebuilt");
        Ok(())
    }
}

impl<E1, E2, T1, T2, K> std::fmt::Debug for Collection<E1, E2, T1, T2, K>
where
    T1: std::fmt::Debug,
    T2: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("config", &self.config)
            .field("len", &self.len.load(Ordering::Relaxed))
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_index::{FieldComparator, Order};

    type Plain = Collection<f64, i64, i64, f64, ()>;
    type Keyed = Collection<f64, i64, i64, f64, String>;

    fn keyed() -> Keyed {
        CollectionBuilder::new().keyed().build()
    }

    fn ordered_by_field2() -> Plain {
        CollectionBuilder::new()
            .ordered_by(FieldComparator::field2(Order::Asc))
            .build()
    }

    #[test]
    fn test_push_assigns_increasing_ids() {
        let c = Plain::new();
        assert_eq!(c.push(1.0, 1), FIRST_RECORD_ID);
        assert_eq!(c.push(1.0, 1), FIRST_RECORD_ID + 1);
        assert_eq!(c.size(), 2);
        assert!(c.contains(1));
        assert!(!c.contains(3));
    }

    #[test]
    fn test_erase_unknown_is_noop() {
        let c = Plain::new();
        c.push(1.0, 4);
        assert!(!c.erase(99));
        assert_eq!(c.total1(), 4);
        assert_eq!(c.size(), 1);
    }

    #[test]
    fn test_erase_twice() {
        let c = Plain::new();
        let id = c.push(1.0, 4);
        assert!(c.erase(id));
        assert!(!c.erase(id));
        assert!(c.is_empty());
        assert_eq!(c.totals(), (0, 0.0));
    }

    #[test]
    fn test_set_field_unknown_id() {
        let c = Plain::new();
        assert!(!c.set_field1(1, 2.0));
        assert!(!c.set_fields(1, 2.0, 3));
        assert!(c.field1_cell(1).is_none());
    }

    #[test]
    fn test_set_field_same_value_is_silent() {
        let c = Plain::new();
        let id = c.push(1.0, 4);
        assert!(c.set_field2(id, 4));
        assert_eq!(c.total1(), 4);
    }

    #[test]
    fn test_set_fields_both() {
        let c = Plain::new();
        let id = c.push(1.0, 4);
        assert!(c.set_fields(id, 2.0, 5));
        assert_eq!(c.totals(), (5, 10.0));
        assert_eq!(c.get(id).map(|v| v.snapshot()), Some(Snapshot::new(2.0, 5)));
    }

    #[test]
    fn test_push_keyed_requires_keyed() {
        let c: Collection<f64, i64, i64, f64, String> = Collection::new();
        assert_eq!(c.push_keyed(1.0, 1, "a".into()), Err(Error::NotKeyed));
        assert!(c.is_empty());
        assert_eq!(c.find_by_key(&"a".into()), None);
    }

    #[test]
    fn test_push_keyed_duplicate() {
        let c = keyed();
        let id = c.push_keyed(1.0, 1, "a".into()).unwrap();
        assert!(matches!(
            c.push_keyed(2.0, 2, "a".into()),
            Err(Error::DuplicateKey { .. })
        ));
        assert_eq!(c.size(), 1);
        assert_eq!(c.total1(), 1);

        // The rejected push did not consume an id.
        assert_eq!(c.push_keyed(2.0, 2, "b".into()).unwrap(), id + 1);
    }

    #[test]
    fn test_key_reusable_after_erase() {
        let c = keyed();
        c.push_keyed(1.0, 1, "a".into()).unwrap();
        assert!(c.erase_by_key(&"a".into()));
        assert!(!c.erase_by_key(&"a".into()));
        let id = c.push_keyed(1.0, 2, "a".into()).unwrap();
        assert_eq!(c.find_by_key(&"a".into()), Some(id));
        assert_eq!(c.find_by_key_linear(&"a".into()), Some(id));
    }

    #[test]
    fn test_unkeyed_push_on_keyed_collection() {
        let c = keyed();
        let id = c.push(1.0, 1);
        assert_eq!(c.get(id).and_then(|v| v.key), None);
    }

    #[test]
    fn test_push_batch_keys_by_position() {
        let c = keyed();
        let keys = vec!["a".to_string(), "b".to_string()];
        let ids = c.push_batch(&[(1.0, 1), (2.0, 2), (3.0, 3)], Some(keys.as_slice())).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(c.find_by_key(&"a".into()), Some(ids[0]));
        assert_eq!(c.find_by_key(&"b".into()), Some(ids[1]));
        assert_eq!(c.get(ids[2]).and_then(|v| v.key), None);
        assert_eq!(c.total1(), 6);
    }

    #[test]
    fn test_push_batch_rejects_duplicates_atomically() {
        let c = keyed();
        c.push_keyed(0.0, 0, "live".into()).unwrap();

        let within = vec!["x".to_string(), "x".to_string()];
        assert!(c.push_batch(&[(1.0, 1), (2.0, 2)], Some(within.as_slice())).is_err());

        let against = vec!["y".to_string(), "live".to_string()];
        assert!(c.push_batch(&[(1.0, 1), (2.0, 2)], Some(against.as_slice())).is_err());

        assert_eq!(c.size(), 1);
        assert_eq!(c.find_by_key(&"y".into()), None);
    }

    #[test]
    fn test_push_batch_extra_keys_ignored() {
        let c = keyed();
        let keys = vec!["a".to_string(), "b".to_string()];
        let ids = c.push_batch(&[(1.0, 1)], Some(keys.as_slice())).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(c.find_by_key(&"b".into()), None);
    }

    #[test]
    fn test_ordering_disabled() {
        let c = Plain::new();
        assert_eq!(c.top_k(1), Err(Error::OrderingDisabled));
        assert_eq!(c.ordered_ids(), Err(Error::OrderingDisabled));
        assert_eq!(c.rebuild_order(), Err(Error::OrderingDisabled));
        assert!(c.set_compare(FieldComparator::field1(Order::Asc)).is_err());
        assert!(c.ordered_iter().is_err());
    }

    #[test]
    fn test_ordered_follows_field_writes() {
        let c = ordered_by_field2();
        let a = c.push(1.0, 10);
        let b = c.push(1.0, 20);
        let d = c.push(1.0, 15);
        assert_eq!(c.ordered_ids().unwrap(), vec![a, d, b]);

        c.set_field2(a, 30);
        assert_eq!(c.ordered_ids().unwrap(), vec![d, b, a]);
        assert_eq!(c.ordered_ids_rev().unwrap(), vec![a, b, d]);
        assert_eq!(c.top_k(2).unwrap(), vec![a, b]);
        assert_eq!(c.bottom_k(1).unwrap(), vec![d]);

        // Field1 does not affect a field2 ordering.
        c.set_field1(d, 99.0);
        assert_eq!(c.ordered_ids().unwrap(), vec![d, b, a]);
    }

    #[test]
    fn test_ordered_range() {
        let c = ordered_by_field2();
        let ids: Vec<_> = [5, 10, 15, 20].iter().map(|&v| c.push(0.0, v)).collect();
        let got = c.range(Snapshot::new(0.0, 10), Snapshot::new(0.0, 15)).unwrap();
        assert_eq!(got, vec![ids[1], ids[2]]);
        assert!(c.range(Snapshot::new(0.0, 15), Snapshot::new(0.0, 10)).unwrap().is_empty());
    }

    #[test]
    fn test_ordered_nan_field_stays_indexed() {
        let c: Plain = CollectionBuilder::new()
            .ordered_by(FieldComparator::field1(Order::Asc))
            .build();
        let a = c.push(2.0, 1);
        let nan = c.push(f64::NAN, 1);
        let b = c.push(1.0, 1);
        assert_eq!(c.ordered_ids().unwrap(), vec![b, a, nan]);

        assert!(c.erase(nan));
        assert_eq!(c.size(), 2);
        assert_eq!(c.ordered_ids().unwrap(), vec![b, a]);

        let d = c.push(f64::NAN, 2);
        c.set_field1(d, 0.5);
        assert_eq!(c.ordered_ids().unwrap(), vec![d, b, a]);

        c.set_field1(a, f64::NAN);
        assert_eq!(c.ordered_ids().unwrap(), vec![d, b, a]);
        c.set_field1(a, 0.0);
        assert_eq!(c.ordered_ids().unwrap(), vec![a, d, b]);

        assert!(c.erase(a));
        assert!(c.erase(b));
        assert!(c.erase(d));
        assert!(c.ordered_ids().unwrap().is_empty());
    }

    #[test]
    fn test_set_compare_rebuilds() {
        let c = ordered_by_field2();
        let a = c.push(3.0, 1);
        let b = c.push(1.0, 2);
        assert_eq!(c.ordered_ids().unwrap(), vec![a, b]);

        c.set_compare(FieldComparator::field1(Order::Asc)).unwrap();
        assert_eq!(c.ordered_ids().unwrap(), vec![b, a]);

        c.set_field1(b, 5.0);
        assert_eq!(c.ordered_ids().unwrap(), vec![a, b]);

        c.rebuild_order().unwrap();
        assert_eq!(c.ordered_ids().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_ordered_iter_views() {
        let c: Collection<f64, i64, i64, f64, String> = CollectionBuilder::new()
            .keyed()
            .ordered_by(FieldComparator::field2(Order::Desc))
            .build();
        c.push_keyed(1.0, 1, "low".into()).unwrap();
        c.push_keyed(1.0, 9, "high".into()).unwrap();

        let keys: Vec<_> = c.ordered_iter().unwrap().map(|v| v.key.unwrap()).collect();
        assert_eq!(keys, vec!["high".to_string(), "low".to_string()]);
    }

    #[test]
    fn test_iter_double_ended() {
        let c = Plain::new();
        for v in 1..=3 {
            c.push(1.0, v);
        }
        let forward: Vec<_> = c.iter().map(|v| v.id).collect();
        let backward: Vec<_> = c.iter().rev().map(|v| v.id).collect();
        assert_eq!(forward, vec![1, 2, 3]);
        assert_eq!(backward, vec![3, 2, 1]);
        assert_eq!(c.iter().len(), 3);
    }

    #[test]
    fn test_clear_resets_everything() {
        let c: Collection<f64, i64, i64, f64, String> = CollectionBuilder::new()
            .keyed()
            .ordered()
            .mode1(AggMode::Max)
            .build();
        c.push_keyed(1.0, 3, "a".into()).unwrap();
        let last = c.push_keyed(2.0, 8, "b".into()).unwrap();

        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.totals(), (0, 0.0));
        assert_eq!(c.find_by_key(&"a".into()), None);
        assert!(c.ordered_ids().unwrap().is_empty());
        assert_eq!(c.iter().count(), 0);

        let id = c.push_keyed(1.0, 2, "a".into()).unwrap();
        assert!(id > last);
        assert_eq!(c.total1(), 2);
    }

    #[test]
    fn test_field_cell_routes_writes() {
        let c = Plain::new();
        let id = c.push(1.0, 4);
        let cell = c.field2_cell(id).unwrap();
        assert_eq!(cell.id(), id);
        assert_eq!(cell.get(), 4);

        cell.set(6);
        assert_eq!(c.total1(), 6);
        assert_eq!(c.total2(), 6.0);

        let f1 = c.field1_cell(id).unwrap();
        f1.set(0.5);
        assert_eq!(c.total2(), 3.0);
    }

    #[test]
    fn test_field_cell_after_erase_is_inert() {
        let c = Plain::new();
        let id = c.push(1.0, 4);
        let cell = c.field2_cell(id).unwrap();
        c.erase(id);
        cell.set(100);
        assert_eq!(c.totals(), (0, 0.0));
    }

    #[test]
    fn test_index_stats_track_peak() {
        let c: Keyed = CollectionBuilder::new().keyed().ordered().build();
        let a = c.push_keyed(1.0, 1, "a".into()).unwrap();
        c.push_keyed(2.0, 2, "b".into()).unwrap();
        c.push(3.0, 3);
        c.erase(a);

        let keys = c.key_index_stats().unwrap();
        assert_eq!((keys.entries(), keys.peak_entries()), (1, 2));
        let ordered = c.ordered_index_stats().unwrap();
        assert_eq!((ordered.entries(), ordered.peak_entries()), (2, 3));

        c.clear();
        assert_eq!(c.ordered_index_stats().unwrap().entries(), 0);
        assert_eq!(c.ordered_index_stats().unwrap().peak_entries(), 3);

        let plain = Plain::new();
        assert_eq!(plain.key_index_stats().unwrap_err(), Error::NotKeyed);
        assert_eq!(plain.ordered_index_stats().unwrap_err(), Error::OrderingDisabled);
    }

    #[test]
    fn test_coarse_lock_is_reentrant() {
        let c: Plain = CollectionBuilder::new().coarse_lock(true).build();
        let guard = c.lock();
        assert!(guard.is_some());
        c.push(1.0, 2);
        assert_eq!(c.total1(), 2);
        drop(guard);

        assert!(Plain::new().lock().is_none());
    }
}
