//! Ordered identity index.
//!
//! An `OrderedIndex` keeps live record ids in a total order defined by a
//! runtime comparator over the records' snapshots, with the id breaking ties.
//! Each entry carries the snapshot it was ordered by, so the index never
//! reaches back into record storage while comparing.
//!
//! Moving a record is always remove-with-old-snapshot followed by
//! insert-with-new-snapshot ([`OrderedIndex::reposition`]). Changing the
//! comparator rebuilds the whole set ([`OrderedIndex::rebuild`]); entries
//! ordered under one comparator are never compared under another.

use crate::comparator::SharedComparator;
use crate::stats::IndexStats;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::cmp::Ordering;
use tally_core::{RecordId, Snapshot};

/// One position in the ordered index.
struct Entry<E1, E2> {
    snapshot: Snapshot<E1, E2>,
    id: RecordId,
    comparator: SharedComparator<Snapshot<E1, E2>>,
}

impl<E1, E2> Entry<E1, E2> {
    fn new(id: RecordId, snapshot: Snapshot<E1, E2>, comparator: &SharedComparator<Snapshot<E1, E2>>) -> Self {
        Self {
            snapshot,
            id,
            comparator: comparator.clone(),
        }
    }
}

impl<E1, E2> PartialEq for Entry<E1, E2> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E1, E2> Eq for Entry<E1, E2> {}

impl<E1, E2> PartialOrd for Entry<E1, E2> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E1, E2> Ord for Entry<E1, E2> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator
            .compare(&self.snapshot, &other.snapshot)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A totally ordered set of record ids.
pub struct OrderedIndex<E1, E2> {
    entries: BTreeSet<Entry<E1, E2>>,
    comparator: SharedComparator<Snapshot<E1, E2>>,
    stats: IndexStats,
}

impl<E1: Clone, E2: Clone> OrderedIndex<E1, E2> {
    /// Creates an empty index ordered by `comparator`.
    pub fn new(comparator: SharedComparator<Snapshot<E1, E2>>) -> Self {
        Self {
            entries: BTreeSet::new(),
            comparator,
            stats: IndexStats::new(),
        }
    }

    /// Returns the active comparator.
    pub fn comparator(&self) -> &SharedComparator<Snapshot<E1, E2>> {
        &self.comparator
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Returns true if `a` and `b` occupy the same position under the active
    /// comparator.
    pub fn is_equivalent(&self, a: &Snapshot<E1, E2>, b: &Snapshot<E1, E2>) -> bool {
        self.comparator.is_equivalent(a, b)
    }

    /// Inserts `id` at the position of `snapshot`. Returns false if already present.
    pub fn insert(&mut self, id: RecordId, snapshot: Snapshot<E1, E2>) -> bool {
        let inserted = self.entries.insert(Entry::new(id, snapshot, &self.comparator));
        if inserted {
            self.stats.add_entries(1);
        }
        inserted
    }

    /// Removes `id`, located by the snapshot it was inserted (or last
    /// repositioned) with. Returns false if not found.
    pub fn remove(&mut self, id: RecordId, snapshot: &Snapshot<E1, E2>) -> bool {
        let probe = Entry::new(id, snapshot.clone(), &self.comparator);
        let removed = self.entries.remove(&probe);
        if removed {
            self.stats.remove_entries(1);
        }
        removed
    }

    /// Moves `id` from the position of `old` to the position of `new`.
    ///
    /// Does nothing when the two snapshots are equivalent, since the position
    /// would not change. Returns true if the entry moved.
    pub fn reposition(&mut self, id: RecordId, old: &Snapshot<E1, E2>, new: &Snapshot<E1, E2>) -> bool {
        if self.is_equivalent(old, new) {
            return false;
        }
        if self.remove(id, old) {
            self.insert(id, new.clone());
            true
        } else {
            false
        }
    }

    /// Replaces the comparator and rebuilds the set from a full scan.
    ///
    /// The new set is built off to the side and swapped in whole.
    pub fn rebuild<I>(&mut self, comparator: SharedComparator<Snapshot<E1, E2>>, records: I)
    where
        I: IntoIterator<Item = (RecordId, Snapshot<E1, E2>)>,
    {
        let fresh: BTreeSet<Entry<E1, E2>> = records
            .into_iter()
            .map(|(id, snapshot)| Entry::new(id, snapshot, &comparator))
            .collect();
        self.stats.set_entries(fresh.len());
        self.entries = fresh;
        self.comparator = comparator;
    }

    /// Returns all ids in ascending order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Returns all ids in descending order.
    pub fn ids_rev(&self) -> Vec<RecordId> {
        self.entries.iter().rev().map(|e| e.id).collect()
    }

    /// Iterates `(id, snapshot)` pairs in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (RecordId, &Snapshot<E1, E2>)> + '_ {
        self.entries.iter().map(|e| (e.id, &e.snapshot))
    }

    /// Returns the `k` greatest ids, greatest first.
    pub fn top_k(&self, k: usize) -> Vec<RecordId> {
        self.entries.iter().rev().take(k).map(|e| e.id).collect()
    }

    /// Returns the `k` least ids, least first.
    pub fn bottom_k(&self, k: usize) -> Vec<RecordId> {
        self.entries.iter().take(k).map(|e| e.id).collect()
    }

    /// Returns ids whose snapshots lie within `[lower, upper]` under the
    /// comparator, ascending. Empty if `lower` orders after `upper`.
    pub fn range(&self, lower: Snapshot<E1, E2>, upper: Snapshot<E1, E2>) -> Vec<RecordId> {
        if self.comparator.is_greater(&lower, &upper) {
            return Vec::new();
        }
        let lo = Entry::new(RecordId::MIN, lower, &self.comparator);
        let hi = Entry::new(RecordId::MAX, upper, &self.comparator);
        self.entries.range(lo..=hi).map(|e| e.id).collect()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry. The comparator is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.clear();
    }
}

impl<E1, E2> core::fmt::Debug for OrderedIndex<E1, E2> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderedIndex")
            .field("len", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}
