//! Comparator implementations for the ordered index.
//!
//! This module provides comparators for ordering record snapshots. Any
//! `Fn(&K, &K) -> Ordering` is a comparator, so ad-hoc orderings can be passed
//! as closures.

use alloc::sync::Arc;
use core::cmp::Ordering;
use tally_core::Snapshot;

/// Sort order for index keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (smallest first)
    #[default]
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Trait for comparing index keys.
///
/// Implementations must be a strict weak ordering: `Equal` is read as
/// "equivalent", and equivalent keys are tie-broken by record id.
pub trait Comparator<K> {
    /// Compares two keys according to the comparator's ordering.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns true if a < b according to this comparator.
    fn is_less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Returns true if a > b according to this comparator.
    fn is_greater(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Returns true if neither key orders before the other.
    fn is_equivalent(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

impl<K, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// A comparator shared between the ordered index and every entry it holds.
pub type SharedComparator<K> = Arc<dyn Comparator<K> + Send + Sync>;

/// Which part of a snapshot a [`FieldComparator`] looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Order by the first field only.
    Field1,
    /// Order by the second field only.
    Field2,
    /// Order by the first field, then the second.
    #[default]
    Lexicographic,
}

/// A comparator over record snapshots using the fields' `PartialOrd`.
///
/// A value that is not comparable with itself (NaN) sorts after every other
/// value, and all such values are equivalent, so the ordering stays a strict
/// weak ordering for floating point fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldComparator {
    key: SortKey,
    order: Order,
}

impl FieldComparator {
    /// Creates a new field comparator.
    pub fn new(key: SortKey, order: Order) -> Self {
        Self { key, order }
    }

    /// Orders by the first field.
    pub fn field1(order: Order) -> Self {
        Self::new(SortKey::Field1, order)
    }

    /// Orders by the second field.
    pub fn field2(order: Order) -> Self {
        Self::new(SortKey::Field2, order)
    }

    /// Orders by both fields, first field major.
    pub fn lexicographic(order: Order) -> Self {
        Self::new(SortKey::Lexicographic, order)
    }

    /// Returns the sort key.
    pub fn key(&self) -> SortKey {
        self.key
    }

    /// Returns the order of this comparator.
    pub fn order(&self) -> Order {
        self.order
    }
}

#[inline]
fn partial<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    match a.partial_cmp(b) {
        Some(ord) => ord,
        None => unordered(a).cmp(&unordered(b)),
    }
}

#[inline]
fn unordered<T: PartialOrd>(v: &T) -> bool {
    v.partial_cmp(v).is_none()
}

impl<E1: PartialOrd, E2: PartialOrd> Comparator<Snapshot<E1, E2>> for FieldComparator {
    fn compare(&self, a: &Snapshot<E1, E2>, b: &Snapshot<E1, E2>) -> Ordering {
        let ord = match self.key {
            SortKey::Field1 => partial(&a.field1, &b.field1),
            SortKey::Field2 => partial(&a.field2, &b.field2),
            SortKey::Lexicographic => {
                partial(&a.field1, &b.field1).then_with(|| partial(&a.field2, &b.field2))
            }
        };
        self.order.apply(ord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(a: f64, b: i64) -> Snapshot<f64, i64> {
        Snapshot::new(a, b)
    }

    #[test]
    fn test_order_apply() {
        assert_eq!(Order::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Order::Asc.apply(Ordering::Greater), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Order::Desc.apply(Ordering::Greater), Ordering::Less);
    }

    #[test]
    fn test_field1_comparator() {
        let cmp = FieldComparator::field1(Order::Asc);
        assert_eq!(cmp.compare(&snap(1.0, 9), &snap(2.0, 0)), Ordering::Less);
        // Second field is ignored
        assert!(cmp.is_equivalent(&snap(1.0, 9), &snap(1.0, 0)));
    }

    #[test]
    fn test_field2_comparator_desc() {
        let cmp = FieldComparator::field2(Order::Desc);
        assert_eq!(cmp.compare(&snap(0.0, 10), &snap(0.0, 5)), Ordering::Less);
        assert_eq!(cmp.compare(&snap(0.0, 5), &snap(0.0, 10)), Ordering::Greater);
    }

    #[test]
    fn test_lexicographic_comparator() {
        let cmp = FieldComparator::default();
        assert_eq!(cmp.compare(&snap(1.0, 10), &snap(2.0, 5)), Ordering::Less);
        assert_eq!(cmp.compare(&snap(1.0, 10), &snap(1.0, 5)), Ordering::Greater);
        assert_eq!(cmp.compare(&snap(1.0, 5), &snap(1.0, 5)), Ordering::Equal);
    }

    #[test]
    fn test_nan_sorts_last() {
        let cmp = FieldComparator::field1(Order::Asc);
        assert!(cmp.is_greater(&snap(f64::NAN, 0), &snap(1.0, 0)));
        assert!(cmp.is_less(&snap(f64::INFINITY, 0), &snap(f64::NAN, 0)));
        assert!(cmp.is_equivalent(&snap(f64::NAN, 0), &snap(-f64::NAN, 0)));

        let desc = FieldComparator::field1(Order::Desc);
        assert!(desc.is_less(&snap(f64::NAN, 0), &snap(1.0, 0)));
    }

    #[test]
    fn test_nan_lexicographic_is_transitive() {
        let cmp = FieldComparator::default();
        let a = snap(1.0, 5);
        let b = snap(f64::NAN, 0);
        let c = snap(2.0, 1);
        assert!(cmp.is_less(&a, &c));
        assert!(cmp.is_less(&c, &b));
        assert!(cmp.is_less(&a, &b));
        assert!(cmp.is_less(&snap(f64::NAN, 1), &snap(f64::NAN, 2)));
    }

    #[test]
    fn test_closure_comparator() {
        // Order by product of the two fields
        let cmp = |a: &Snapshot<f64, i64>, b: &Snapshot<f64, i64>| {
            (a.field1 * a.field2 as f64).total_cmp(&(b.field1 * b.field2 as f64))
        };
        assert!(cmp.is_less(&snap(1.0, 2), &snap(3.0, 1)));
        assert!(cmp.is_greater(&snap(4.0, 1), &snap(1.0, 3)));
    }

    #[test]
    fn test_shared_comparator_object() {
        let shared: SharedComparator<Snapshot<f64, i64>> =
            Arc::new(FieldComparator::field2(Order::Asc));
        assert!(shared.is_less(&snap(0.0, 1), &snap(0.0, 2)));
    }
}
