//! Aggregation modes for totals.

/// How a total is derived from the live records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AggMode {
    /// Running sum of per-record deltas.
    #[default]
    Add,
    /// Minimum extracted value across live records.
    Min,
    /// Maximum extracted value across live records.
    Max,
}

impl AggMode {
    /// Returns true if this mode is maintained through a count-indexed tracker.
    #[inline]
    pub fn is_tracked(&self) -> bool {
        !matches!(self, AggMode::Add)
    }
}
