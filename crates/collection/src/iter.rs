//! Iteration over collection contents.

use std::vec;

use crate::record::RecordView;

/// Iterator over point-in-time copies of records.
///
/// The records are copied when the iterator is created, so the collection
/// may be mutated while iterating.
#[derive(Debug)]
pub struct Iter<E1, E2, K> {
    inner: vec::IntoIter<RecordView<E1, E2, K>>,
}

impl<E1, E2, K> Iter<E1, E2, K> {
    pub(crate) fn new(views: Vec<RecordView<E1, E2, K>>) -> Self {
        Self {
            inner: views.into_iter(),
        }
    }
}

impl<E1, E2, K> Iterator for Iter<E1, E2, K> {
    type Item = RecordView<E1, E2, K>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<E1, E2, K> DoubleEndedIterator for Iter<E1, E2, K> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<E1, E2, K> ExactSizeIterator for Iter<E1, E2, K> {}
