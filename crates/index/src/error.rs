//! Error type for index operations.

use thiserror::Error;

/// Error type for index operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Attempted to bind a key that is already bound.
    #[error("Duplicate key in unique index")]
    DuplicateKey,
}
