//! Per-total aggregation strategies.
//!
//! A total is described by a `TotalSpec`: how a record's field transition
//! turns into an additive delta, how that delta is folded into the total,
//! which value Min/Max tracking extracts from a record, and the mode.

use std::fmt;
use std::sync::Arc;

use tally_core::{AggMode, Field, Numeric, Snapshot, Total};

/// Computes the additive contribution of a transition from `last` to `new`.
pub struct DeltaFn<E1, E2, T>(Arc<dyn Fn(&Snapshot<E1, E2>, &Snapshot<E1, E2>) -> T + Send + Sync>);

impl<E1, E2, T> Clone for DeltaFn<E1, E2, T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E1, E2, T> fmt::Debug for DeltaFn<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeltaFn(..)")
    }
}

impl<E1, E2, T> DeltaFn<E1, E2, T> {
    /// Wraps a closure called as `f(new, last)`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Snapshot<E1, E2>, &Snapshot<E1, E2>) -> T + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluates the delta.
    #[inline]
    pub fn call(&self, new: &Snapshot<E1, E2>, last: &Snapshot<E1, E2>) -> T {
        (self.0)(new, last)
    }
}

impl<E1, E2, T: Total> DeltaFn<E1, E2, T> {
    /// Always contributes `T::default()`.
    pub fn noop() -> Self {
        Self::new(|_, _| T::default())
    }
}

impl<E1: Numeric, E2: Numeric, T: Numeric> DeltaFn<E1, E2, T> {
    /// `new.field2 - last.field2`.
    pub fn difference2() -> Self {
        Self::new(|new, last| new.field2.cast::<T>().minus(last.field2.cast::<T>()))
    }

    /// `new.field2 * new.field1 - last.field2 * last.field1`.
    pub fn weighted() -> Self {
        Self::new(|new, last| {
            let now = new.field2.cast::<T>().times(new.field1.cast::<T>());
            let before = last.field2.cast::<T>().times(last.field1.cast::<T>());
            now.minus(before)
        })
    }

    /// The new value of field1, for use with `ApplyStrategy::set_latest`.
    pub fn latest1() -> Self {
        Self::new(|new, _| new.field1.cast::<T>())
    }

    /// The new value of field2, for use with `ApplyStrategy::set_latest`.
    pub fn latest2() -> Self {
        Self::new(|new, _| new.field2.cast::<T>())
    }
}

/// Projects the value a Min/Max total tracks out of a record.
pub struct ExtractFn<E1, E2, T>(Arc<dyn Fn(&Snapshot<E1, E2>) -> T + Send + Sync>);

impl<E1, E2, T> Clone for ExtractFn<E1, E2, T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E1, E2, T> fmt::Debug for ExtractFn<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtractFn(..)")
    }
}

impl<E1, E2, T> ExtractFn<E1, E2, T> {
    /// Wraps a closure mapping a snapshot to the value a Min/Max total tracks.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Snapshot<E1, E2>) -> T + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Extracts the tracked value.
    #[inline]
    pub fn call(&self, snapshot: &Snapshot<E1, E2>) -> T {
        (self.0)(snapshot)
    }
}

impl<E1: Numeric, E2: Numeric, T: Numeric> ExtractFn<E1, E2, T> {
    /// `field1`.
    pub fn field1() -> Self {
        Self::new(|s| s.field1.cast::<T>())
    }

    /// `field2`.
    pub fn field2() -> Self {
        Self::new(|s| s.field2.cast::<T>())
    }

    /// `field1 * field2`.
    pub fn product() -> Self {
        Self::new(|s| s.field1.cast::<T>().times(s.field2.cast::<T>()))
    }
}

type ApplyFn<T> = Arc<dyn Fn(&mut T, &T) -> bool + Send + Sync>;

/// Folds a delta into an Add-mode total.
pub enum ApplyStrategy<T> {
    /// `Total::accumulate`; always reports a change.
    Add,
    /// A caller-supplied fold returning whether the total changed.
    Custom(ApplyFn<T>),
}

impl<T> Default for ApplyStrategy<T> {
    fn default() -> Self {
        ApplyStrategy::Add
    }
}

impl<T> Clone for ApplyStrategy<T> {
    fn clone(&self) -> Self {
        match self {
            ApplyStrategy::Add => ApplyStrategy::Add,
            ApplyStrategy::Custom(f) => ApplyStrategy::Custom(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for ApplyStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyStrategy::Add => f.write_str("Add"),
            ApplyStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<T: Total> ApplyStrategy<T> {
    /// Wraps a custom fold.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut T, &T) -> bool + Send + Sync + 'static,
    {
        ApplyStrategy::Custom(Arc::new(f))
    }

    /// Never changes the total.
    pub fn noop() -> Self {
        Self::custom(|_, _| false)
    }

    /// Replaces the total with the delta.
    pub fn set_latest() -> Self {
        Self::custom(|total, delta| {
            if total == delta {
                return false;
            }
            *total = delta.clone();
            true
        })
    }

    /// Returns true for the default accumulate fold.
    pub fn is_default(&self) -> bool {
        matches!(self, ApplyStrategy::Add)
    }

    /// Folds `delta` into `total`, returning whether it changed.
    pub fn apply(&self, total: &mut T, delta: &T) -> bool {
        match self {
            ApplyStrategy::Add => {
                total.accumulate(delta);
                true
            }
            ApplyStrategy::Custom(f) => f(total, delta),
        }
    }
}

impl<T: Numeric> ApplyStrategy<T> {
    /// Accumulates but keeps the total within `[min, max]`.
    pub fn clamped(min: T, max: T) -> Self {
        Self::custom(move |total, delta| {
            let mut next = total.plus(*delta);
            if next < min {
                next = min;
            } else if next > max {
                next = max;
            }
            if next == *total {
                return false;
            }
            *total = next;
            true
        })
    }
}

/// The effect of one record transition on one total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition<T> {
    /// Contribution for Add mode.
    pub delta: T,
    /// Extracted value leaving the tracker, for Min/Max.
    pub old: Option<T>,
    /// Extracted value entering the tracker, for Min/Max.
    pub new: Option<T>,
}

/// Complete description of how one total is maintained.
pub struct TotalSpec<E1, E2, T> {
    pub mode: AggMode,
    pub delta: DeltaFn<E1, E2, T>,
    pub apply: ApplyStrategy<T>,
    pub extract: ExtractFn<E1, E2, T>,
}

impl<E1, E2, T> Clone for TotalSpec<E1, E2, T> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            delta: self.delta.clone(),
            apply: self.apply.clone(),
            extract: self.extract.clone(),
        }
    }
}

impl<E1, E2, T> fmt::Debug for TotalSpec<E1, E2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotalSpec")
            .field("mode", &self.mode)
            .field("apply", &self.apply)
            .finish_non_exhaustive()
    }
}

impl<E1: Field, E2: Field, T: Total> TotalSpec<E1, E2, T> {
    /// An Add-mode total with the default fold.
    pub fn new(delta: DeltaFn<E1, E2, T>, extract: ExtractFn<E1, E2, T>) -> Self {
        Self {
            mode: AggMode::Add,
            delta,
            apply: ApplyStrategy::Add,
            extract,
        }
    }

    /// Sets the aggregation mode.
    pub fn with_mode(mut self, mode: AggMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the Add-mode fold.
    pub fn with_apply(mut self, apply: ApplyStrategy<T>) -> Self {
        self.apply = apply;
        self
    }

    /// Sets the delta function.
    pub fn with_delta(mut self, delta: DeltaFn<E1, E2, T>) -> Self {
        self.delta = delta;
        self
    }

    /// Sets the Min/Max projection.
    pub fn with_extract(mut self, extract: ExtractFn<E1, E2, T>) -> Self {
        self.extract = extract;
        self
    }

    /// Computes the transition of a record from `last` to `new`.
    ///
    /// `None` stands for absence: `last` is `None` on insert and `new` is
    /// `None` on removal. Deltas treat absence as the zero snapshot. Only the
    /// parts the mode consumes are computed.
    pub fn transition(&self, last: Option<&Snapshot<E1, E2>>, new: Option<&Snapshot<E1, E2>>) -> Transition<T> {
        if self.mode.is_tracked() {
            return Transition {
                delta: T::default(),
                old: last.map(|s| self.extract.call(s)),
                new: new.map(|s| self.extract.call(s)),
            };
        }
        let zero = Snapshot::zero();
        Transition {
            delta: self.delta.call(new.unwrap_or(&zero), last.unwrap_or(&zero)),
            old: None,
            new: None,
        }
    }
}

impl<E1: Numeric, E2: Numeric, T: Numeric> TotalSpec<E1, E2, T> {
    /// Default first total: sum of field2, or Min/Max of field2.
    pub fn total1() -> Self {
        Self::new(DeltaFn::difference2(), ExtractFn::field2())
    }

    /// Default second total: sum of field1 * field2, or Min/Max of it.
    pub fn total2() -> Self {
        Self::new(DeltaFn::weighted(), ExtractFn::product())
    }
}
