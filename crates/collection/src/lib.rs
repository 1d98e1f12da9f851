//! Tally Collection - A reactive two-field collection with incrementally
//! maintained totals.
//!
//! Each record holds two fields. The collection keeps two totals over all
//! live records consistent on every push, erase and field write, without
//! rescanning: Add totals fold in per-record deltas, Min/Max totals track
//! every record's extracted value in a count index.
//!
//! # Core Concepts
//!
//! - `Collection`: records, indexes and the aggregate engine behind one facade
//! - `CollectionBuilder`: keyed / ordered / locking / publication options and
//!   per-total strategies
//! - `FieldCell`: a read/observe/write handle on one field of one record
//! - `RecordView`: a copy of a record returned by lookups and iteration
//!
//! Totals are reactive cells: observe them with `tally_reactive::observe`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tally_collection::{Collection, CollectionBuilder};
//! use tally_core::AggMode;
//! use tally_reactive::observe;
//!
//! let c: Collection = CollectionBuilder::new().mode1(AggMode::Min).build();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//! let _obs = observe(c.total1_cell(), move |min| log.lock().push(min));
//!
//! let ids: Vec<_> = [10, 20, 15, 5, 20].iter().map(|&v| c.push(1.0, v)).collect();
//! assert_eq!(c.total1(), 5);
//!
//! c.set_field2(ids[3], 30);
//! assert_eq!(c.total1(), 10);
//! assert_eq!(*seen.lock(), vec![10, 5, 10]);
//! ```

mod collection;
mod config;
mod field;
mod iter;
mod record;

pub use collection::Collection;
pub use config::{CollectionBuilder, CollectionConfig};
pub use field::FieldCell;
pub use iter::Iter;
pub use record::RecordView;

pub use tally_core::{AggMode, Error, RecordId, Result, Snapshot};
pub use tally_incremental::{ApplyStrategy, DeltaFn, ExtractFn, Publication, TotalSpec};
pub use tally_index::{Comparator, FieldComparator, IndexStats, Order, SortKey};
pub use tally_reactive::{observe, observe2, transaction, Cell, Observer};
