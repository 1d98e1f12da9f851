//! Error types for tally collections.

use alloc::string::String;
use thiserror::Error;

/// Result type alias for tally operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for collection operations.
///
/// Lookups of unknown ids or keys are not errors: they return `None` or
/// `false`. This enum only covers requests the collection cannot honor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A key is already bound to a live record.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// Debug rendering of the rejected key.
        key: String,
    },
    /// A keyed operation was requested on a collection built without a key index.
    #[error("collection is not keyed")]
    NotKeyed,
    /// An ordered query was requested on a collection built without an ordered index.
    #[error("collection has no ordered index")]
    OrderingDisabled,
}

impl Error {
    /// Creates a duplicate key error from any debuggable key.
    pub fn duplicate_key(key: &impl core::fmt::Debug) -> Self {
        Error::DuplicateKey {
            key: alloc::format!("{:?}", key),
        }
    }
}
