//! Tally Core - Core types shared by all tally crates.
//!
//! This crate provides the foundational vocabulary of a two-field aggregate
//! collection:
//!
//! - `Field`, `Total`, `Key`: bounds for record fields, aggregate totals and keys
//! - `Numeric`: primitive numbers usable by the default strategies
//! - `RecordId`, `Snapshot`: record identity and a copy of its two fields
//! - `AggMode`: Add / Min / Max aggregation
//! - `Error`: Error types for collection operations
//!
//! # Example
//!
//! ```rust
//! use tally_core::{Numeric, Snapshot, Total};
//!
//! let before: Snapshot<f64, i64> = Snapshot::zero();
//! let after = Snapshot::new(1.5, 10);
//!
//! // The default weighted delta: field1 * field2, cast to the total type.
//! let delta: f64 = after.field2.cast::<f64>() * after.field1
//!     - before.field2.cast::<f64>() * before.field1;
//!
//! let mut total = 0.0f64;
//! total.accumulate(&delta);
//! assert_eq!(total, 15.0);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod mode;
mod record;
mod value;

pub use error::{Error, Result};
pub use mode::AggMode;
pub use record::{RecordId, Snapshot, FIRST_RECORD_ID};
pub use value::{Field, Key, Numeric, Repr, Total};
