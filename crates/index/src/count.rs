//! Count-indexed tracker for Min/Max totals.
//!
//! A `CountIndex` is an ordered multiset stored as value -> occurrence count.
//! Many records producing the same extracted value share one entry, so
//! duplicates cost a counter bump instead of a tree node each.

use alloc::collections::BTreeMap;
use core::cmp::Ordering;
use tally_core::{AggMode, Total};

/// Orders values through [`Total::rank`] so floats can be used as keys.
#[derive(Clone, Debug)]
struct Ranked<T>(T);

impl<T: Total> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.rank(&other.0) == Ordering::Equal
    }
}

impl<T: Total> Eq for Ranked<T> {}

impl<T: Total> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Total> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank(&other.0)
    }
}

/// Ordered value -> count map answering "current min/max" in O(log n).
///
/// Invariants: every stored count is positive, and `len()` is the sum of all
/// counts.
#[derive(Clone, Debug)]
pub struct CountIndex<T> {
    counts: BTreeMap<Ranked<T>, usize>,
    len: usize,
}

impl<T: Total> Default for CountIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Total> CountIndex<T> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
            len: 0,
        }
    }

    /// Records one more occurrence of `value`.
    pub fn insert(&mut self, value: T) {
        *self.counts.entry(Ranked(value)).or_insert(0) += 1;
        self.len += 1;
    }

    /// Removes one occurrence of `value`.
    ///
    /// The entry is dropped when its count reaches zero. Returns false if the
    /// value was not tracked.
    pub fn erase_one(&mut self, value: T) -> bool {
        let key = Ranked(value);
        match self.counts.get_mut(&key) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&key);
                }
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Returns the boundary value for the given mode: least for `Min`,
    /// greatest for `Max`, `None` for `Add` or when empty.
    pub fn top(&self, mode: AggMode) -> Option<&T> {
        match mode {
            AggMode::Min => self.min(),
            AggMode::Max => self.max(),
            AggMode::Add => None,
        }
    }

    /// Returns the smallest tracked value.
    #[inline]
    pub fn min(&self) -> Option<&T> {
        self.counts.keys().next().map(|k| &k.0)
    }

    /// Returns the largest tracked value.
    #[inline]
    pub fn max(&self) -> Option<&T> {
        self.counts.keys().next_back().map(|k| &k.0)
    }

    /// Returns how many records currently produce `value`.
    pub fn count(&self, value: &T) -> usize {
        self.counts.get(&Ranked(value.clone())).copied().unwrap_or(0)
    }

    /// Returns the total number of occurrences (sum of counts).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of distinct values.
    #[inline]
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if nothing is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates `(value, count)` pairs in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&T, usize)> + '_ {
        self.counts.iter().map(|(k, &c)| (&k.0, c))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.len = 0;
    }
}
