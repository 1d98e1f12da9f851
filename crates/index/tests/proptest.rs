//! Property-based tests for tally-index using proptest.

use std::sync::Arc;

use proptest::prelude::*;
use tally_core::{AggMode, RecordId, Snapshot};
use tally_index::{CountIndex, FieldComparator, KeyIndex, Order, OrderedIndex};

#[derive(Clone, Debug)]
enum CountOp {
    Insert(i64),
    Erase(i64),
}

fn count_op() -> impl Strategy<Value = CountOp> {
    prop_oneof![
        (0i64..50).prop_map(CountOp::Insert),
        (0i64..50).prop_map(CountOp::Erase),
    ]
}

proptest! {
    /// CountIndex min/max always matches a naive multiset.
    #[test]
    fn count_index_matches_multiset(ops in prop::collection::vec(count_op(), 1..300)) {
        let mut index = CountIndex::new();
        let mut naive: Vec<i64> = Vec::new();

        for op in ops {
            match op {
                CountOp::Insert(v) => {
                    index.insert(v);
                    naive.push(v);
                }
                CountOp::Erase(v) => {
                    let expected = naive.iter().position(|&x| x == v);
                    prop_assert_eq!(index.erase_one(v), expected.is_some());
                    if let Some(pos) = expected {
                        naive.swap_remove(pos);
                    }
                }
            }
            prop_assert_eq!(index.len(), naive.len());
            prop_assert_eq!(index.top(AggMode::Min).copied(), naive.iter().min().copied());
            prop_assert_eq!(index.top(AggMode::Max).copied(), naive.iter().max().copied());
        }

        // No zero counts are ever left behind
        prop_assert!(index.iter().all(|(_, c)| c > 0));
    }

    /// Ordered index iteration matches a sort of (snapshot, id), and reverse is its mirror.
    #[test]
    fn ordered_index_matches_sort(
        values in prop::collection::vec((0i64..20, 0i64..20), 1..200),
        moves in prop::collection::vec((0usize..200, 0i64..20), 0..100),
    ) {
        let cmp = Arc::new(FieldComparator::field2(Order::Asc));
        let mut index: OrderedIndex<i64, i64> = OrderedIndex::new(cmp);
        let mut current: Vec<(RecordId, Snapshot<i64, i64>)> = Vec::new();

        for (i, (a, b)) in values.iter().enumerate() {
            let id = i as RecordId + 1;
            let snap = Snapshot::new(*a, *b);
            index.insert(id, snap);
            current.push((id, snap));
        }

        for (slot, v) in moves {
            if slot < current.len() {
                let (id, old) = current[slot];
                let new = Snapshot::new(old.field1, v);
                index.reposition(id, &old, &new);
                current[slot].1 = new;
            }
        }

        let mut expected = current.clone();
        expected.sort_by(|(ia, a), (ib, b)| a.field2.cmp(&b.field2).then(ia.cmp(ib)));
        let expected_ids: Vec<RecordId> = expected.iter().map(|(id, _)| *id).collect();

        prop_assert_eq!(index.ids(), expected_ids.clone());
        let mut reversed = expected_ids;
        reversed.reverse();
        prop_assert_eq!(index.ids_rev(), reversed.clone());
        prop_assert_eq!(index.top_k(5), reversed.into_iter().take(5).collect::<Vec<_>>());
    }

    /// Every key bound in the key index resolves to its id until removed.
    #[test]
    fn key_index_roundtrip(keys in prop::collection::hash_set(0u32..10000, 1..300)) {
        let mut index = KeyIndex::new();
        for (i, &k) in keys.iter().enumerate() {
            prop_assert!(index.add(k, i as RecordId).is_ok());
        }
        for (i, &k) in keys.iter().enumerate() {
            prop_assert_eq!(index.get(&k), Some(i as RecordId));
            prop_assert!(index.add(k, 0).is_err());
        }
        for &k in &keys {
            prop_assert!(index.remove(&k, None).is_some());
        }
        prop_assert!(index.is_empty());
    }
}
