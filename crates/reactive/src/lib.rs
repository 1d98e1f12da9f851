//! Tally Reactive - Minimal reactive substrate for tally.
//!
//! This crate provides the small amount of reactivity the aggregate collection
//! needs from its environment:
//!
//! - `Cell<T>`: a shared value whose writes notify subscribers
//! - `observe` / `observe2`: attach a callback to one or two cells
//! - `Observer`: handle that detaches the callback on `close` or drop
//! - `transaction`: defer and coalesce notifications until the outermost
//!   transaction on the current thread returns
//!
//! Notifications are synchronous and run on the writing thread.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tally_reactive::{observe2, transaction, Cell};
//!
//! let sum = Cell::new(0i64);
//! let min = Cell::new(0i64);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//! let _obs = observe2(&sum, &min, move |s, m| log.lock().push((s, m)));
//!
//! transaction(|| {
//!     sum.set(10);
//!     min.set(3);
//! });
//!
//! assert_eq!(*seen.lock(), vec![(10, 3)]);
//! ```

mod cell;
mod observer;
pub mod subscription;
mod transaction;

pub use cell::Cell;
pub use observer::{observe, observe2, Observer};
pub use subscription::{Callback, SubscriptionId, SubscriptionManager};
pub use transaction::{in_transaction, transaction};
