//! Index statistics for tally indexes.
//!
//! This module provides entry counters shared by the key and ordered indexes.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for an index.
#[derive(Debug)]
pub struct IndexStats {
    /// Number of entries currently in the index.
    entries: AtomicUsize,
    /// Largest number of entries the index has held at once.
    peak_entries: AtomicUsize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self {
            entries: AtomicUsize::new(0),
            peak_entries: AtomicUsize::new(0),
        }
    }

    /// Returns the number of entries.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }

    /// Returns the largest number of entries seen.
    pub fn peak_entries(&self) -> usize {
        self.peak_entries.load(Ordering::Relaxed)
    }

    /// Increments the entry count by the given amount.
    pub fn add_entries(&self, count: usize) {
        let now = self.entries.fetch_add(count, Ordering::Relaxed) + count;
        self.peak_entries.fetch_max(now, Ordering::Relaxed);
    }

    /// Decrements the entry count by the given amount.
    pub fn remove_entries(&self, count: usize) {
        self.entries.fetch_sub(count, Ordering::Relaxed);
    }

    /// Sets the entry count, e.g. after a rebuild.
    pub fn set_entries(&self, count: usize) {
        self.entries.store(count, Ordering::Relaxed);
        self.peak_entries.fetch_max(count, Ordering::Relaxed);
    }

    /// Resets the entry count to zero. The peak is preserved.
    pub fn clear(&self) {
        self.entries.store(0, Ordering::Relaxed);
    }
}

impl Default for IndexStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IndexStats {
    fn clone(&self) -> Self {
        Self {
            entries: AtomicUsize::new(self.entries()),
            peak_entries: AtomicUsize::new(self.peak_entries()),
        }
    }
}
