//! Axis comparators shared by construction, insertion, lookup and search.

use nearest_tz_types::point::{XyzPoint, compare_coord};
use std::cmp::Ordering;

/// Splitting axis of a k-d tree level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Number of dimensions the axes cycle through.
    pub const COUNT: usize = 3;

    /// The axis a node at `depth` splits on: `depth mod 3`.
    #[inline]
    pub fn of_depth(depth: usize) -> Self {
        match depth % Self::COUNT {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    #[inline]
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    #[inline]
    pub fn coord(self, point: &XyzPoint) -> f64 {
        match self {
            Axis::X => point.x(),
            Axis::Y => point.y(),
            Axis::Z => point.z(),
        }
    }

    /// Compare on this axis only.
    #[inline]
    pub fn compare(self, a: &XyzPoint, b: &XyzPoint) -> Ordering {
        compare_coord(self.coord(a), self.coord(b))
    }

    /// Compare on this axis, then on the two remaining axes in cyclic order.
    ///
    /// Points that tie on the split axis are ordered by the other coordinates, so
    /// only exact duplicates compare equal. The split axis still leads, which keeps
    /// every point of a `lesser` subtree at or below the splitting plane.
    #[inline]
    pub fn compare_full(self, a: &XyzPoint, b: &XyzPoint) -> Ordering {
        let second = self.next();
        let third = second.next();
        self.compare(a, b)
            .then_with(|| second.compare(a, b))
            .then_with(|| third.compare(a, b))
    }
}
