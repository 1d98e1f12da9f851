//! Field handles.

use std::fmt;

use tally_core::{Field, RecordId};
use tally_reactive::{observe, Cell, Observer};

/// Handle to one field of one record.
///
/// Reads come straight from the field's cell. Writes go through the owning
/// collection so the record's totals and ordered position follow.
pub struct FieldCell<'a, E> {
    id: RecordId,
    cell: Cell<E>,
    write: Box<dyn Fn(E) + Send + Sync + 'a>,
}

impl<'a, E: Field> FieldCell<'a, E> {
    pub(crate) fn new(id: RecordId, cell: Cell<E>, write: Box<dyn Fn(E) + Send + Sync + 'a>) -> Self {
        Self { id, cell, write }
    }

    /// Returns the id of the record this field belongs to.
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn get(&self) -> E {
        self.cell.get()
    }

    /// Writes the field through the collection.
    pub fn set(&self, value: E) {
        (self.write)(value)
    }

    /// Calls `f` with the field's value whenever it changes.
    pub fn observe<F>(&self, f: F) -> Observer
    where
        F: Fn(E) + Send + Sync + 'static,
    {
        observe(&self.cell, f)
    }
}

impl<E: fmt::Debug> fmt::Debug for FieldCell<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCell")
            .field("id", &self.id)
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}
