//! Key index implementation.
//!
//! This module provides a unique hash index from application keys to record
//! ids for O(1) keyed lookup.

use crate::error::IndexError;
use crate::stats::IndexStats;
use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashMap;
use tally_core::RecordId;

/// A unique hash index from keys to record ids.
#[derive(Debug)]
pub struct KeyIndex<K> {
    /// The underlying map from keys to record ids.
    map: HashMap<K, RecordId>,
    /// Statistics for this index.
    stats: IndexStats,
}

impl<K: Eq + Hash> Default for KeyIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> KeyIndex<K> {
    /// Creates a new key index.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Returns the statistics for this index.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Binds `key` to `id`. Fails if the key is already bound.
    pub fn add(&mut self, key: K, id: RecordId) -> Result<(), IndexError> {
        match self.map.entry(key) {
            hashbrown::hash_map::Entry::Occupied(_) => Err(IndexError::DuplicateKey),
            hashbrown::hash_map::Entry::Vacant(slot) => {
                slot.insert(id);
                self.stats.add_entries(1);
                Ok(())
            }
        }
    }

    /// Returns the id bound to `key`.
    #[inline]
    pub fn get(&self, key: &K) -> Option<RecordId> {
        self.map.get(key).copied()
    }

    /// Unbinds `key`.
    ///
    /// With `expected = Some(id)` the key is only removed if it is bound to
    /// that id. Returns the removed id.
    pub fn remove(&mut self, key: &K, expected: Option<RecordId>) -> Option<RecordId> {
        let bound = self.map.get(key).copied()?;
        if expected.is_some_and(|id| id != bound) {
            return None;
        }
        self.map.remove(key);
        self.stats.remove_entries(1);
        Some(bound)
    }

    /// Checks if the index contains the given key.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the number of bound keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no key is bound.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns all bound record ids.
    pub fn ids(&self) -> Vec<RecordId> {
        self.map.values().copied().collect()
    }

    /// Clears all entries from the index.
    pub fn clear(&mut self) {
        self.map.clear();
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn test_key_index_unique() {
        let mut index: KeyIndex<i32> = KeyIndex::new();

        assert!(index.add(1, 100).is_ok());
        assert!(index.add(2, 200).is_ok());
        assert_eq!(index.add(1, 101), Err(IndexError::DuplicateKey));

        assert_eq!(index.get(&1), Some(100));
        assert_eq!(index.get(&2), Some(200));
        assert_eq!(index.get(&3), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_key_index_remove() {
        let mut index: KeyIndex<String> = KeyIndex::new();
        index.add("rec-A".into(), 1).unwrap();

        assert_eq!(index.remove(&"rec-A".into(), None), Some(1));
        assert!(!index.contains_key(&"rec-A".into()));
        assert_eq!(index.remove(&"rec-A".into(), None), None);
        assert_eq!(index.stats().entries(), 0);
    }

    #[test]
    fn test_key_index_remove_expected_id() {
        let mut index: KeyIndex<&str> = KeyIndex::new();
        index.add("a", 1).unwrap();

        // Bound to a different record: left alone
        assert_eq!(index.remove(&"a", Some(2)), None);
        assert_eq!(index.get(&"a"), Some(1));

        assert_eq!(index.remove(&"a", Some(1)), Some(1));
        assert!(index.is_empty());
    }

    #[test]
    fn test_key_index_rebind_after_remove() {
        let mut index: KeyIndex<&str> = KeyIndex::new();
        index.add("a", 1).unwrap();
        index.remove(&"a", None);
        assert!(index.add("a", 2).is_ok());
        assert_eq!(index.get(&"a"), Some(2));
    }

    #[test]
    fn test_key_index_clear() {
        let mut index: KeyIndex<u8> = KeyIndex::new();
        index.add(1, 1).unwrap();
        index.add(2, 2).unwrap();
        let mut ids = index.ids();
        ids.sort_unstable();
        assert_eq!(ids, alloc::vec![1, 2]);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.stats().entries(), 0);
    }
}
