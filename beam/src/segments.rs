use super::*;

use core::iter;
use num_traits::AsPrimitive;

/// A straight piece of a beam's path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<const D: usize> {
    pub start: SVector<Float, D>,
    pub end: SVector<Float, D>,
}

impl<const D: usize> Segment<D> {
    #[inline]
    pub fn new(start: impl Into<SVector<Float, D>>, end: impl Into<SVector<Float, D>>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    #[inline]
    pub fn length(&self) -> Float {
        (self.end - self.start).norm()
    }

    /// `None` for zero-length segments
    #[inline]
    pub fn direction(&self) -> Option<Unit<SVector<Float, D>>> {
        Unit::try_new(self.end - self.start, Float::EPSILON)
    }
}

/// A polyline with a fixed, preallocated capacity.
///
/// Clearing only rewinds the write cursor: the storage is allocated once
/// and slots are overwritten in order by the following writes.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentBuffer<const D: usize> {
    slots: Box<[Segment<D>]>,
    len: usize,
}

impl<const D: usize> SegmentBuffer<D> {
    pub fn with_capacity(capacity: usize) -> Self {
        let zero = Segment::new(SVector::zeros(), SVector::zeros());

        Self {
            slots: iter::repeat(zero).take(capacity).collect(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of segments written since the last [`clear`](Self::clear)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns `false`, and writes nothing, if the buffer is full.
    #[inline]
    pub fn push(&mut self, segment: Segment<D>) -> bool {
        let Some(slot) = self.slots.get_mut(self.len) else {
            return false;
        };

        *slot = segment;
        self.len += 1;
        true
    }

    /// Appends a segment going from the end of the last one to `point`.
    ///
    /// Returns `false` if the buffer is empty or full.
    #[inline]
    pub fn extend_to(&mut self, point: impl Into<SVector<Float, D>>) -> bool {
        match self.last() {
            Some(last) => {
                let start = last.end;
                self.push(Segment::new(start, point))
            }
            None => false,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[Segment<D>] {
        &self.slots[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Segment<D>> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn last(&self) -> Option<&Segment<D>> {
        self.as_slice().last()
    }

    /// Vertices of the written segments, as a line list: `start, end, start, end...`
    #[inline]
    pub fn points(&self) -> impl Iterator<Item = &SVector<Float, D>> + '_ {
        self.iter().flat_map(|s| [&s.start, &s.end])
    }

    /// Flattened coordinates of [`points`](Self::points), cast to `T`,
    /// ready to be uploaded to a vertex buffer.
    pub fn positions<T: Copy + 'static>(&self) -> Vec<T>
    where
        Float: AsPrimitive<T>,
    {
        self.points()
            .flat_map(|p| p.iter().map(|&c| c.as_()))
            .collect()
    }

    pub fn total_length(&self) -> Float {
        self.iter().map(Segment::length).sum()
    }
}

impl<'a, const D: usize> IntoIterator for &'a SegmentBuffer<D> {
    type Item = &'a Segment<D>;
    type IntoIter = core::slice::Iter<'a, Segment<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
