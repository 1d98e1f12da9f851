//! Tally Index - Index implementations for tally collections.
//!
//! This crate provides the three indexes a collection maintains:
//!
//! - `CountIndex`: value -> occurrence count, answering min/max for Min/Max totals
//! - `OrderedIndex`: record ids ordered by a runtime comparator over snapshots
//! - `KeyIndex`: O(1) exact-match lookup from application key to record id
//!
//! The indexes are plain data structures; synchronization is the owner's job.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_core::{AggMode, Snapshot};
//! use tally_index::{CountIndex, FieldComparator, Order, OrderedIndex};
//!
//! let mut counts = CountIndex::new();
//! counts.insert(10i64);
//! counts.insert(5);
//! assert_eq!(counts.top(AggMode::Min), Some(&5));
//!
//! let mut ordered: OrderedIndex<f64, i64> = OrderedIndex::new(Arc::new(FieldComparator::field2(Order::Asc)));
//! ordered.insert(1, Snapshot::new(1.2, 10i64));
//! ordered.insert(2, Snapshot::new(2.5, 3i64));
//! assert_eq!(ordered.top_k(1), vec![1]);
//! ```

#![no_std]

extern crate alloc;

pub mod comparator;
pub mod count;
pub mod error;
pub mod key;
pub mod ordered;
pub mod stats;

pub use comparator::{Comparator, FieldComparator, Order, SharedComparator, SortKey};
pub use count::CountIndex;
pub use error::IndexError;
pub use key::KeyIndex;
pub use ordered::OrderedIndex;
pub use stats::IndexStats;
