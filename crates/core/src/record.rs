//! Record identifiers and field snapshots.

/// Unique identifier for a record.
///
/// Assigned monotonically per collection starting at [`FIRST_RECORD_ID`] and
/// never reused.
pub type RecordId = u64;

/// The first identifier handed out by a collection.
pub const FIRST_RECORD_ID: RecordId = 1;

/// A point-in-time copy of a record's two fields.
///
/// Snapshots are what deltas, extractors and comparators look at: the "before"
/// and "after" states of a transition, and the ordering key of the ordered index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Snapshot<E1, E2> {
    /// Value of the first field.
    pub field1: E1,
    /// Value of the second field.
    pub field2: E2,
}

impl<E1, E2> Snapshot<E1, E2> {
    /// Creates a snapshot from the two field values.
    #[inline]
    pub fn new(field1: E1, field2: E2) -> Self {
        Self { field1, field2 }
    }

    /// Splits the snapshot into its fields.
    #[inline]
    pub fn into_parts(self) -> (E1, E2) {
        (self.field1, self.field2)
    }
}

impl<E1: Default, E2: Default> Snapshot<E1, E2> {
    /// The zero state: both fields at their default value.
    ///
    /// Used as the "before" state of a push and the "after" state of an erase.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }
}

impl<E1, E2> From<(E1, E2)> for Snapshot<E1, E2> {
    fn from((field1, field2): (E1, E2)) -> Self {
        Self::new(field1, field2)
    }
}
