//! Tally Incremental - Incremental aggregate maintenance for tally.
//!
//! This crate keeps two running totals consistent with a changing set of
//! two-field records without recomputing them from scratch. Every insert,
//! field change and removal is turned into a `Transition` per total and
//! applied by the `AggregateEngine`.
//!
//! # Core Concepts
//!
//! - `DeltaFn`: additive contribution of a record transition (Add mode)
//! - `ApplyStrategy`: how a delta is folded into an Add-mode total
//! - `ExtractFn`: the per-record value tracked by Min/Max totals
//! - `TotalSpec`: mode plus the three strategies for one total
//! - `AggregateEngine`: owns the total cells and applies transitions
//! - `Publication`: independent or combined-atomic publication of the totals
//!
//! # Example
//!
//! ```rust
//! use tally_core::Snapshot;
//! use tally_incremental::{AggregateEngine, Publication, TotalSpec};
//!
//! let engine: AggregateEngine<f64, i64, i64, f64> =
//!     AggregateEngine::new(TotalSpec::total1(), TotalSpec::total2(), Publication::Independent);
//!
//! let a = Snapshot::new(1.2, 10);
//! let b = Snapshot::new(2.5, 3);
//! engine.apply_change(None, Some(&a));
//! engine.apply_change(None, Some(&b));
//!
//! assert_eq!(engine.total1(), 13);
//! assert!((engine.total2() - 19.5).abs() < 1e-9);
//! ```

pub mod engine;
pub mod strategy;

pub use engine::{AggregateEngine, Publication};
pub use strategy::{ApplyStrategy, DeltaFn, ExtractFn, TotalSpec, Transition};
