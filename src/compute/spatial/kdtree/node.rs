use crate::compute::spatial::axis::Axis;
use nearest_tz_types::point::{Cartesian, XyzPoint};
use std::cmp::Ordering;

/// Index of a node in the tree's arena.
///
/// Identity of a node, independent of the point it stores: two nodes holding
/// equal points have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Lesser,
    Greater,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Lesser => Side::Greater,
            Side::Greater => Side::Lesser,
        }
    }
}

/// A k-d tree node.
///
/// The tree's arena owns every node; `lesser` and `greater` are owned children,
/// `parent` is a back-reference used for the upward walk of nearest-neighbour
/// search and for reattaching a rebuilt subtree.
#[derive(Debug, Clone)]
pub(crate) struct KdNode<T> {
    pub(crate) point: T,
    pub(crate) depth: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) lesser: Option<NodeId>,
    pub(crate) greater: Option<NodeId>,
}

impl<T> KdNode<T> {
    pub(crate) fn new(point: T, depth: usize, parent: Option<NodeId>) -> Self {
        Self {
            point,
            depth,
            parent,
            lesser: None,
            greater: None,
        }
    }

    #[inline]
    pub(crate) fn axis(&self) -> Axis {
        Axis::of_depth(self.depth)
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Lesser => self.lesser,
            Side::Greater => self.greater,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Lesser => self.lesser = child,
            Side::Greater => self.greater = child,
        }
    }
}

impl<T: Cartesian> KdNode<T> {
    /// The child slot `point` descends into: lesser when it compares `<= 0` against
    /// this node's point on this node's axis, greater otherwise.
    #[inline]
    pub(crate) fn side_for(&self, point: &XyzPoint) -> Side {
        match self.axis().compare_full(point, self.point.xyz()) {
            Ordering::Greater => Side::Greater,
            Ordering::Less | Ordering::Equal => Side::Lesser,
        }
    }
}
