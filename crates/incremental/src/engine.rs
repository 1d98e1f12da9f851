//! The aggregate application engine.
//!
//! `AggregateEngine` owns the two total cells and applies record transitions
//! to them. Add totals with the default fold are updated with a single atomic
//! cell update. Custom folds and Min/Max totals run under a per-total lock;
//! Min/Max totals keep a `CountIndex` of every live record's extracted value
//! and republish the extreme only when it moves.

use parking_lot::{Mutex, ReentrantMutex};
use tally_core::{AggMode, Field, Snapshot, Total};
use tally_index::CountIndex;
use tally_reactive::{transaction, Cell};
use tracing::trace;

use crate::strategy::{ApplyStrategy, TotalSpec, Transition};

/// How the two totals are published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Publication {
    /// Each total is updated and published on its own.
    #[default]
    Independent,
    /// Both totals are computed under one lock and published together in one
    /// transaction, before the lock is released.
    CombinedAtomic,
}

/// One total: its cell, how it is folded, and its Min/Max tracker.
///
/// The tracker mutex doubles as the per-total lock.
struct Slot<T> {
    cell: Cell<T>,
    mode: AggMode,
    apply: ApplyStrategy<T>,
    tracker: Mutex<CountIndex<T>>,
}

impl<T: Total> Slot<T> {
    fn new(mode: AggMode, apply: ApplyStrategy<T>) -> Self {
        Self {
            cell: Cell::new(T::default()),
            mode,
            apply,
            tracker: Mutex::new(CountIndex::new()),
        }
    }

    /// Applies `tr` and publishes the result on its own.
    fn apply_independent(&self, tr: Transition<T>) {
        match self.mode {
            AggMode::Add if self.apply.is_default() => {
                self.cell.update(|total| {
                    total.accumulate(&tr.delta);
                    true
                });
            }
            AggMode::Add => {
                let _guard = self.tracker.lock();
                let mut total = self.cell.get();
                if self.apply.apply(&mut total, &tr.delta) {
                    self.cell.set(total);
                }
            }
            AggMode::Min | AggMode::Max => {
                let mut tracker = self.tracker.lock();
                let top = Self::track(&mut tracker, self.mode, tr);
                self.cell.update(|total| replace_if_changed(total, top));
            }
        }
    }

    /// Folds `tr` into `total`, returning whether it changed. The caller holds
    /// the combined lock.
    fn step(&self, total: &mut T, tr: Transition<T>) -> bool {
        match self.mode {
            AggMode::Add => self.apply.apply(total, &tr.delta),
            AggMode::Min | AggMode::Max => {
                let mut tracker = self.tracker.lock();
                let top = Self::track(&mut tracker, self.mode, tr);
                replace_if_changed(total, top)
            }
        }
    }

    fn track(tracker: &mut CountIndex<T>, mode: AggMode, tr: Transition<T>) -> T {
        if let Some(old) = tr.old {
            tracker.erase_one(old);
        }
        if let Some(new) = tr.new {
            tracker.insert(new);
        }
        tracker.top(mode).cloned().unwrap_or_default()
    }

    fn reset(&self) {
        self.tracker.lock().clear();
        self.cell.set(T::default());
    }
}

fn replace_if_changed<T: PartialEq>(total: &mut T, value: T) -> bool {
    if *total == value {
        return false;
    }
    *total = value;
    true
}

/// Maintains two totals over a changing set of two-field records.
///
/// # Example
///
/// ```rust
/// use tally_core::{AggMode, Snapshot};
/// use tally_incremental::{AggregateEngine, Publication, TotalSpec};
///
/// let engine: AggregateEngine<f64, i64, i64, f64> = AggregateEngine::new(
///     TotalSpec::total1().with_mode(AggMode::Min),
///     TotalSpec::total2(),
///     Publication::Independent,
/// );
///
/// engine.apply_change(None, Some(&Snapshot::new(1.5, 4)));
/// engine.apply_change(None, Some(&Snapshot::new(2.0, 9)));
/// assert_eq!(engine.totals(), (4, 24.0));
/// ```
pub struct AggregateEngine<E1, E2, T1, T2> {
    spec1: TotalSpec<E1, E2, T1>,
    spec2: TotalSpec<E1, E2, T2>,
    slot1: Slot<T1>,
    slot2: Slot<T2>,
    publication: Publication,
    combined: ReentrantMutex<()>,
}

impl<E1, E2, T1, T2> AggregateEngine<E1, E2, T1, T2>
where
    E1: Field,
    E2: Field,
    T1: Total,
    T2: Total,
{
    /// Creates an engine with both totals at their zero value.
    pub fn new(spec1: TotalSpec<E1, E2, T1>, spec2: TotalSpec<E1, E2, T2>, publication: Publication) -> Self {
        let slot1 = Slot::new(spec1.mode, spec1.apply.clone());
        let slot2 = Slot::new(spec2.mode, spec2.apply.clone());
        Self {
            spec1,
            spec2,
            slot1,
            slot2,
            publication,
            combined: ReentrantMutex::new(()),
        }
    }

    /// Returns the publication discipline.
    pub fn publication(&self) -> Publication {
        self.publication
    }

    /// Returns the aggregation modes of both totals.
    pub fn modes(&self) -> (AggMode, AggMode) {
        (self.slot1.mode, self.slot2.mode)
    }

    /// Returns the first total's cell.
    pub fn total1_cell(&self) -> &Cell<T1> {
        &self.slot1.cell
    }

    /// Returns the second total's cell.
    pub fn total2_cell(&self) -> &Cell<T2> {
        &self.slot2.cell
    }

    /// Returns the first total.
    pub fn total1(&self) -> T1 {
        self.slot1.cell.get()
    }

    /// Returns the second total.
    pub fn total2(&self) -> T2 {
        self.slot2.cell.get()
    }

    /// Returns both totals. With `CombinedAtomic` publication the pair is read
    /// under the combined lock and belongs to the same mutation.
    ///
    /// The combined lock is reentrant, so observers notified while a pair is
    /// being published may read the totals.
    pub fn totals(&self) -> (T1, T2) {
        match self.publication {
            Publication::Independent => (self.total1(), self.total2()),
            Publication::CombinedAtomic => {
                let _guard = self.combined.lock();
                (self.total1(), self.total2())
            }
        }
    }

    /// Computes both transitions of a record moving from `last` to `new`.
    pub fn transitions(
        &self,
        last: Option<&Snapshot<E1, E2>>,
        new: Option<&Snapshot<E1, E2>>,
    ) -> (Transition<T1>, Transition<T2>) {
        (self.spec1.transition(last, new), self.spec2.transition(last, new))
    }

    /// Computes and applies the transition of a record from `last` to `new`.
    ///
    /// `last` is `None` for an insert and `new` is `None` for a removal.
    pub fn apply_change(&self, last: Option<&Snapshot<E1, E2>>, new: Option<&Snapshot<E1, E2>>) {
        let (tr1, tr2) = self.transitions(last, new);
        self.apply_pair(tr1, tr2);
    }

    /// Applies one transition to each total.
    pub fn apply_pair(&self, tr1: Transition<T1>, tr2: Transition<T2>) {
        match self.publication {
            Publication::Independent => {
                self.slot1.apply_independent(tr1);
                self.slot2.apply_independent(tr2);
            }
            Publication::CombinedAtomic => {
                let _guard = self.combined.lock();
                let mut total1 = self.slot1.cell.get();
                let mut total2 = self.slot2.cell.get();
                let changed1 = self.slot1.step(&mut total1, tr1);
                let changed2 = self.slot2.step(&mut total2, tr2);
                if !(changed1 || changed2) {
                    return;
                }
                transaction(|| {
                    if changed1 {
                        self.slot1.cell.set(total1);
                    }
                    if changed2 {
                        self.slot2.cell.set(total2);
                    }
                });
            }
        }
    }

    /// Clears both trackers and sets both totals to their zero value in one
    /// transaction.
    pub fn reset(&self) {
        let _guard = self.combined.lock();
        transaction(|| {
            self.slot1.reset();
            self.slot2.reset();
        });
        trace!("aggregate totals reset");
    }

    /// Returns the number of values held by each Min/Max tracker.
    pub fn tracked_len(&self) -> (usize, usize) {
        (self.slot1.tracker.lock().len(), self.slot2.tracker.lock().len())
    }
}

impl<E1, E2, T1: std::fmt::Debug, T2: std::fmt::Debug> std::fmt::Debug for AggregateEngine<E1, E2, T1, T2> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateEngine")
            .field("total1", &self.slot1.cell)
            .field("mode1", &self.slot1.mode)
            .field("total2", &self.slot2.cell)
            .field("mode2", &self.slot2.mode)
            .field("publication", &self.publication)
            .finish()
    }
}
