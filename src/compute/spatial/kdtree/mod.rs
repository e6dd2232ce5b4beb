//! Three-dimensional k-d tree over projected geographic points.
//!
//! The tree splits on x, y and z in turn (`depth mod 3`). It is built balanced
//! from a batch of points by median partitioning, and afterwards accepts plain
//! leaf insertions and removals that rebuild the affected subtree. Nothing
//! rebalances the tree after mutation, so heavy insertion or duplicate-heavy
//! input can degrade it towards a list; queries stay correct, only slower.
//!
//! Nodes live in an arena owned by the tree and link to each other by
//! `NodeId`. The parent link is a plain index, so there is no ownership cycle.
//! Node handles never leave the crate:
//!
//! ```compile_fail
//! use nearest_tz::compute::spatial::kdtree::NodeId;
//! ```
//!
//! A tree that is no longer mutated can be queried from many threads at once:
//! every query takes `&self` and the type is `Send + Sync` whenever `T` is.
//!
//! ```rust
//! use nearest_tz::compute::spatial::KdTree;
//! use nearest_tz_types::Location;
//!
//! let tree = KdTree::build(vec![
//!     Location::new(52.52, 13.405, "Europe/Berlin"),
//!     Location::new(48.85, 2.35, "Europe/Paris"),
//! ]);
//!
//! let query = Location::unlabeled(50.0, 5.0);
//! let nearest = tree.nearest(&query)?.expect("tree is not empty");
//! assert_eq!(nearest.point.timezone(), Some("Europe/Paris"));
//! assert!(nearest.distance < 400.0);
//! # Ok::<(), nearest_tz::TzError>(())
//! ```

mod iter;
mod knn;
mod node;
mod printer;

pub use iter::Iter;
pub use knn::Neighbour;
pub(crate) use node::NodeId;

use crate::compute::spatial::axis::Axis;
use crate::compute::validation::validate_cartesian;
use crate::error::Result;
use nearest_tz_types::point::{Cartesian, XyzPoint};
use node::{KdNode, Side};
use std::cmp::Ordering;

/// A 3D k-d tree storing points of type `T`.
///
/// `T` only has to expose its Cartesian position; any other data it carries is
/// returned untouched by lookups and searches. Duplicate points are kept as
/// distinct nodes.
#[derive(Debug, Clone)]
pub struct KdTree<T> {
    nodes: Vec<Option<KdNode<T>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

/// One pending unit of bulk construction.
struct BuildTask<T> {
    points: Vec<T>,
    depth: usize,
    link: Option<(NodeId, Side)>,
}

impl<T> KdTree<T> {
    /// Number of dimensions the tree splits on.
    pub const DIMENSIONS: usize = Axis::COUNT;

    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels from the root to the deepest leaf; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut pending: Vec<(NodeId, usize)> =
            self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, level)) = pending.pop() {
            height = height.max(level);
            let node = self.node(id);
            pending.extend(node.lesser.map(|c| (c, level + 1)));
            pending.extend(node.greater.map(|c| (c, level + 1)));
        }
        height
    }

    /// Drop every point.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Iterate over the stored points: for every node its greater subtree, then
    /// the node itself, then its lesser subtree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, Side::Greater)
    }

    /// The exact reverse of [`KdTree::iter`].
    pub fn iter_rev(&self) -> Iter<'_, T> {
        Iter::new(self, Side::Lesser)
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &KdNode<T> {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {:?}", id),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut KdNode<T> {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling node id {:?}", id),
        }
    }

    fn alloc(&mut self, node: KdNode<T>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> KdNode<T> {
        match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => unreachable!("double release of node {:?}", id),
        }
    }

    /// Take every node of the subtree rooted at `start` out of the arena, pushing
    /// their points to `out`: a node, then its lesser subtree, then its greater one.
    fn drain_subtree(&mut self, start: Option<NodeId>, out: &mut Vec<T>) {
        let mut pending: Vec<NodeId> = start.into_iter().collect();
        while let Some(id) = pending.pop() {
            let node = self.release(id);
            pending.extend(node.greater);
            pending.extend(node.lesser);
            out.push(node.point);
        }
    }
}

impl<T: Cartesian> KdTree<T> {
    /// Build a balanced tree from a batch of points.
    ///
    /// Each level sorts its points on the level's axis, stores the median and
    /// splits the rest into the lesser and greater subtrees. Points with
    /// non-finite coordinates cannot be ordered and are skipped with a warning.
    pub fn build(points: Vec<T>) -> Self {
        let total = points.len();
        let points: Vec<T> = points.into_iter().filter(|p| p.xyz().is_finite()).collect();
        if points.len() < total {
            log::warn!(
                "Skipping {} points with non-finite coordinates",
                total - points.len()
            );
        }

        let mut tree = Self::new();
        tree.nodes.reserve(points.len());
        tree.len = points.len();
        tree.root = tree.build_subtree(points, 0, None);
        log::debug!(
            "Built k-d tree with {} points, height {}",
            tree.len,
            tree.height()
        );
        tree
    }

    /// Build a subtree from `points` with its root at `depth`, attached under
    /// `link` when given. Returns the subtree root.
    ///
    /// Uses an explicit work list, so degenerate input that produces a very deep
    /// tree does not exhaust the call stack.
    fn build_subtree(
        &mut self,
        points: Vec<T>,
        depth: usize,
        link: Option<(NodeId, Side)>,
    ) -> Option<NodeId> {
        let mut subtree_root = None;
        let mut pending = vec![BuildTask {
            points,
            depth,
            link,
        }];

        while let Some(BuildTask {
            mut points,
            depth,
            link,
        }) = pending.pop()
        {
            if points.is_empty() {
                continue;
            }

            let axis = Axis::of_depth(depth);
            points.sort_by(|a, b| axis.compare(a.xyz(), b.xyz()));
            let median = points.swap_remove(points.len() / 2);

            // points on either side of the median may equal it on this axis,
            // so every point is classified again with the full comparison
            let (less, more): (Vec<T>, Vec<T>) = points
                .into_iter()
                .partition(|p| axis.compare_full(p.xyz(), median.xyz()) != Ordering::Greater);

            let parent = link.map(|(parent, _)| parent);
            let id = self.alloc(KdNode::new(median, depth, parent));
            if let Some((parent, side)) = link {
                self.node_mut(parent).set_child(side, Some(id));
            }
            subtree_root.get_or_insert(id);

            pending.push(BuildTask {
                points: more,
                depth: depth + 1,
                link: Some((id, Side::Greater)),
            });
            pending.push(BuildTask {
                points: less,
                depth: depth + 1,
                link: Some((id, Side::Lesser)),
            });
        }

        subtree_root
    }

    /// Add a point as a new leaf. Equal points may be added any number of times.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidInput` if the point has non-finite coordinates; the tree
    /// is left unchanged.
    pub fn insert(&mut self, point: T) -> Result<()> {
        validate_cartesian(point.xyz())?;

        let Some(mut current) = self.root else {
            let id = self.alloc(KdNode::new(point, 0, None));
            self.root = Some(id);
            self.len += 1;
            return Ok(());
        };

        loop {
            let node = self.node(current);
            let side = node.side_for(point.xyz());
            match node.child(side) {
                Some(next) => current = next,
                None => {
                    let depth = node.depth + 1;
                    let id = self.alloc(KdNode::new(point, depth, Some(current)));
                    self.node_mut(current).set_child(side, Some(id));
                    self.len += 1;
                    return Ok(());
                }
            }
        }
    }

    /// Locate the first node holding a point equal to `point`.
    pub(crate) fn exact_search(&self, point: &XyzPoint) -> Option<NodeId> {
        let mut current = self.root?;
        loop {
            let node = self.node(current);
            if node.point.xyz() == point {
                return Some(current);
            }
            current = node.child(node.side_for(point))?;
        }
    }

    /// The stored point equal to `point`, if any.
    pub fn get<Q: Cartesian + ?Sized>(&self, point: &Q) -> Option<&T> {
        self.exact_search(point.xyz()).map(|id| &self.node(id).point)
    }

    pub fn contains<Q: Cartesian + ?Sized>(&self, point: &Q) -> bool {
        self.exact_search(point.xyz()).is_some()
    }

    /// Remove the first stored point equal to `point` and return it.
    ///
    /// The removed node's descendants are rebuilt into a fresh balanced subtree
    /// at the same depth and reattached where the node was.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidInput` if the point has non-finite coordinates; the tree
    /// is left unchanged. A point that is not stored is `Ok(None)`.
    pub fn take<Q: Cartesian + ?Sized>(&mut self, point: &Q) -> Result<Option<T>> {
        validate_cartesian(point.xyz())?;
        let Some(id) = self.exact_search(point.xyz()) else {
            return Ok(None);
        };

        let (depth, parent, lesser, greater) = {
            let node = self.node(id);
            (node.depth, node.parent, node.lesser, node.greater)
        };

        let mut descendants = Vec::new();
        self.drain_subtree(lesser, &mut descendants);
        self.drain_subtree(greater, &mut descendants);
        let removed = self.release(id);

        let link = parent.map(|parent| {
            let side = if self.node(parent).lesser == Some(id) {
                Side::Lesser
            } else {
                Side::Greater
            };
            self.node_mut(parent).set_child(side, None);
            (parent, side)
        });

        let rebuilt = descendants.len();
        let subtree_root = self.build_subtree(descendants, depth, link);
        if link.is_none() {
            self.root = subtree_root;
        }
        self.len -= 1;

        log::debug!(
            "Removed point {} at depth {}, rebuilt {} descendants",
            removed.point.xyz(),
            depth,
            rebuilt
        );
        Ok(Some(removed.point))
    }

    /// Remove the first stored point equal to `point`.
    ///
    /// Returns `Ok(false)` when no such point is stored.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidInput` if the point has non-finite coordinates.
    pub fn remove<Q: Cartesian + ?Sized>(&mut self, point: &Q) -> Result<bool> {
        Ok(self.take(point)?.is_some())
    }
}

impl<T> Default for KdTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Cartesian> FromIterator<T> for KdTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::build(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a KdTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
