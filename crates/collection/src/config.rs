//! Collection configuration and builder.

use std::marker::PhantomData;
use std::sync::Arc;

use tally_core::{AggMode, Field, Key, Numeric, Snapshot, Total};
use tally_incremental::{ApplyStrategy, Publication, TotalSpec};
use tally_index::{Comparator, FieldComparator, Order, SharedComparator};

use crate::collection::Collection;

/// Resolved configuration of a collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Maintain a key index and accept keyed pushes.
    pub keyed: bool,
    /// Maintain an ordered index.
    pub ordered: bool,
    /// Serialize every operation behind one reentrant lock.
    pub coarse_lock: bool,
    /// How the two totals are published.
    pub publication: Publication,
}

/// Builder for `Collection`.
///
/// # Example
///
/// ```rust
/// use tally_collection::{Collection, CollectionBuilder};
/// use tally_core::AggMode;
///
/// let c: Collection<f64, i64, i64, f64, String> = CollectionBuilder::new()
///     .keyed()
///     .ordered()
///     .mode1(AggMode::Min)
///     .build();
///
/// c.push_keyed(1.0, 10, "a".to_string()).unwrap();
/// c.push_keyed(2.0, 4, "b".to_string()).unwrap();
/// assert_eq!(c.total1(), 4);
/// assert_eq!(c.top_k(1).unwrap(), vec![2]);
/// ```
pub struct CollectionBuilder<E1, E2, T1, T2, K = ()> {
    config: CollectionConfig,
    total1: TotalSpec<E1, E2, T1>,
    total2: TotalSpec<E1, E2, T2>,
    comparator: Option<SharedComparator<Snapshot<E1, E2>>>,
    _key: PhantomData<fn() -> K>,
}

impl<E1, E2, T1, T2, K> Default for CollectionBuilder<E1, E2, T1, T2, K>
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

impl<E1, E2, T1, T2, K> CollectionBuilder<E1, E2, T1, T2, K>
where
    E1: Numeric,
    E2: Numeric,
    T1: Numeric,
    T2: Numeric,
    K: Key,
{
    /// Starts from the default totals: Add over field2, and Add over
    /// field1 * field2.
    pub fn new() -> Self {
        Self::from_specs(TotalSpec::total1(), TotalSpec::total2())
    }
}

impl<E1, E2, T1, T2, K> CollectionBuilder<E1, E2, T1, T2, K>
where
    E1: Field + PartialOrd,
    E2: Field + PartialOrd,
    T1: Total,
    T2: Total,
    K: Key,
{
    /// Enables the ordered index, ordered by field1 then field2 ascending.
    pub fn ordered(self) -> Self {
        self.ordered_by(FieldComparator::lexicographic(Order::Asc))
    }
}

impl<E1, E2, T1, T2, K> CollectionBuilder<E1, E2, T1, T2, K>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
    K: Key,
{
    /// Starts from explicit total specifications.
    pub fn from_specs(total1: TotalSpec<E1, E2, T1>, total2: TotalSpec<E1, E2, T2>) -> Self {
        Self {
            config: CollectionConfig::default(),
            total1,
            total2,
            comparator: None,
            _key: PhantomData,
        }
    }

    /// Enables the key index.
    pub fn keyed(mut self) -> Self {
        self.config.keyed = true;
        self
    }

    /// Enables the ordered index with a custom comparator.
    pub fn ordered_by<C>(mut self, comparator: C) -> Self
    where
        C: Comparator<Snapshot<E1, E2>> + Send + Sync + 'static,
    {
        self.config.ordered = true;
        self.comparator = Some(Arc::new(comparator));
        self
    }

    /// Enables or disables the coarse collection-wide lock.
    pub fn coarse_lock(mut self, enabled: bool) -> Self {
        self.config.coarse_lock = enabled;
        self
    }

    /// Publishes both totals together in one transaction.
    pub fn combined_atomic(mut self, enabled: bool) -> Self {
        self.config.publication = if enabled {
            Publication::CombinedAtomic
        } else {
            Publication::Independent
        };
        self
    }

    /// Sets the publication discipline.
    pub fn publication(mut self, publication: Publication) -> Self {
        self.config.publication = publication;
        self
    }

    /// Replaces the first total's specification.
    pub fn total1(mut self, spec: TotalSpec<E1, E2, T1>) -> Self {
        self.total1 = spec;
        self
    }

    /// Replaces the second total's specification.
    pub fn total2(mut self, spec: TotalSpec<E1, E2, T2>) -> Self {
        self.total2 = spec;
        self
    }

    /// Sets the first total's aggregation mode.
    pub fn mode1(mut self, mode: AggMode) -> Self {
        self.total1.mode = mode;
        self
    }

    /// Sets the second total's aggregation mode.
    pub fn mode2(mut self, mode: AggMode) -> Self {
        self.total2.mode = mode;
        self
    }

    /// Sets how the first total folds in its deltas.
    pub fn apply1(mut self, apply: ApplyStrategy<T1>) -> Self {
        self.total1.apply = apply;
        self
    }

    /// Sets how the second total folds in its deltas.
    pub fn apply2(mut self, apply: ApplyStrategy<T2>) -> Self {
        self.total2.apply = apply;
        self
    }

    /// Returns the configuration the collection will be built with.
    pub fn config(&self) -> CollectionConfig {
        self.config
    }

    /// Builds the collection.
    pub fn build(self) -> Collection<E1, E2, T1, T2, K> {
        Collection::with_parts(self.config, self.total1, self.total2, self.comparator)
    }
}
