//! K-nearest-neighbour search with backtracking and hyperplane pruning.

use super::KdTree;
use super::node::{NodeId, Side};
use crate::compute::validation::validate_cartesian;
use crate::error::Result;
use nearest_tz_types::point::{Cartesian, XyzPoint};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A stored point returned by a nearest-neighbour search, with its distance to
/// the query.
#[derive(Debug)]
pub struct Neighbour<'a, T> {
    pub point: &'a T,
    pub distance: f64,
}

impl<T> Clone for Neighbour<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Neighbour<'_, T> {}

/// A scored node. Ordered by distance, then by point, then by node identity, so
/// distinct nodes holding equal points are never merged.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    position: XyzPoint,
    id: NodeId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.compare(&other.position))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// The best candidates seen so far: the `k` nearest plus anything tied with the
/// k-th.
#[derive(Debug)]
struct NeighbourSet {
    k: usize,
    entries: BTreeSet<Candidate>,
}

impl NeighbourSet {
    fn new(k: usize) -> Self {
        Self {
            k,
            entries: BTreeSet::new(),
        }
    }

    /// Distance a point must not exceed to still matter. Unbounded until `k`
    /// candidates have been retained.
    fn bound(&self) -> f64 {
        if self.entries.len() < self.k {
            return f64::INFINITY;
        }
        self.entries
            .last()
            .map_or(f64::INFINITY, |worst| worst.distance)
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.k == 0 {
            return;
        }
        if self.entries.len() < self.k {
            self.entries.insert(candidate);
            return;
        }

        let worst = self.bound();
        if candidate.distance < worst {
            self.entries.insert(candidate);
            self.evict_beyond_kth();
        } else if candidate.distance == worst {
            // ties with the current worst are kept, the result may exceed k
            self.entries.insert(candidate);
        }
    }

    fn evict_beyond_kth(&mut self) {
        let Some(kth) = self.entries.iter().nth(self.k - 1).map(|c| c.distance) else {
            return;
        };
        while let Some(worst) = self.entries.last()
            && worst.distance > kth
        {
            self.entries.pop_last();
        }
    }
}

impl<T: Cartesian> KdTree<T> {
    /// Find the `k` stored points nearest to `query`.
    ///
    /// Points tied in distance with the k-th nearest are all returned, so the
    /// result can hold more than `k` entries. Results come nearest first, ties
    /// ordered by point. An empty tree or `k == 0` yields an empty result.
    ///
    /// The search descends to the leaf the query would be inserted under, then
    /// walks back up to the root scoring every node on the way and exploring the
    /// far side of a split only when its plane is closer than the current k-th
    /// distance.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidInput` if the query has non-finite coordinates.
    pub fn knn<Q: Cartesian + ?Sized>(
        &self,
        k: usize,
        query: &Q,
    ) -> Result<Vec<Neighbour<'_, T>>> {
        let query = query.xyz();
        validate_cartesian(query)?;

        let Some(root) = self.root() else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut leaf = root;
        loop {
            let node = self.node(leaf);
            match node.child(node.side_for(query)) {
                Some(next) => leaf = next,
                None => break,
            }
        }

        let mut best = NeighbourSet::new(k);
        let mut examined = FxHashSet::default();
        let mut pending = Vec::new();

        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            self.examine(id, query, &mut best, &mut examined, &mut pending);
            while let Some((child, parent, side)) = pending.pop() {
                if self.plane_within_bound(parent, side, query, best.bound()) {
                    self.examine(child, query, &mut best, &mut examined, &mut pending);
                }
            }
            cursor = self.node(id).parent;
        }

        Ok(best
            .entries
            .into_iter()
            .map(|c| Neighbour {
                point: &self.node(c.id).point,
                distance: c.distance,
            })
            .collect())
    }

    /// The nearest stored point to `query`, if the tree is not empty.
    ///
    /// With several points at exactly the same distance the one first in point
    /// order is returned.
    ///
    /// # Errors
    ///
    /// `TzError::InvalidInput` if the query has non-finite coordinates.
    pub fn nearest<Q: Cartesian + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Option<Neighbour<'_, T>>> {
        Ok(self.knn(1, query)?.into_iter().next())
    }

    /// Score one node and queue its unexamined children, far side first so the
    /// near side is explored before it.
    fn examine(
        &self,
        id: NodeId,
        query: &XyzPoint,
        best: &mut NeighbourSet,
        examined: &mut FxHashSet<NodeId>,
        pending: &mut Vec<(NodeId, NodeId, Side)>,
    ) {
        if !examined.insert(id) {
            return;
        }

        let node = self.node(id);
        let position = *node.point.xyz();
        best.offer(Candidate {
            distance: position.distance(query),
            position,
            id,
        });

        let near = node.side_for(query);
        for side in [near.opposite(), near] {
            if let Some(child) = node.child(side)
                && !examined.contains(&child)
            {
                pending.push((child, id, side));
            }
        }
    }

    /// Whether the `side` half-space of `parent`'s splitting plane can hold a
    /// point within `bound` of the query.
    fn plane_within_bound(
        &self,
        parent: NodeId,
        side: Side,
        query: &XyzPoint,
        bound: f64,
    ) -> bool {
        let node = self.node(parent);
        let axis = node.axis();
        let plane = axis.coord(node.point.xyz());
        let q = axis.coord(query);
        match side {
            Side::Lesser => q - bound <= plane,
            Side::Greater => q + bound >= plane,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(points: &[XyzPoint], k: usize, query: &XyzPoint) -> Vec<f64> {
        if k == 0 {
            return Vec::new();
        }
        let mut distances: Vec<f64> = points.iter().map(|p| p.distance(query)).collect();
        distances.sort_by(f64::total_cmp);
        let Some(&kth) = distances.get(k - 1) else {
            return distances;
        };
        distances.into_iter().filter(|d| *d <= kth).collect()
    }

    fn random_point(rng: &mut StdRng) -> XyzPoint {
        XyzPoint::from_lat_lon(
            rng.random_range(-90.0..=90.0),
            rng.random_range(-180.0..=180.0),
        )
    }

    #[test]
    fn test_knn_empty_tree() {
        let tree: KdTree<XyzPoint> = KdTree::new();
        assert!(tree.knn(3, &XyzPoint::new(0.0, 0.0, 0.0)).unwrap().is_empty());
        assert!(tree.nearest(&XyzPoint::new(0.0, 0.0, 0.0)).unwrap().is_none());
    }

    #[test]
    fn test_knn_zero_is_empty() {
        let tree = KdTree::build(vec![XyzPoint::new(0.0, 0.0, 0.0)]);
        assert!(tree.knn(0, &XyzPoint::new(0.0, 0.0, 0.0)).unwrap().is_empty());
    }

    #[test]
    fn test_knn_rejects_non_finite_query() {
        let tree = KdTree::build(vec![XyzPoint::new(0.0, 0.0, 0.0)]);
        assert!(tree.knn(1, &XyzPoint::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_knn_includes_ties() {
        let tree = KdTree::build(vec![
            XyzPoint::new(1.0, 0.0, 0.0),
            XyzPoint::new(-1.0, 0.0, 0.0),
            XyzPoint::new(0.0, 1.0, 0.0),
            XyzPoint::new(0.0, 0.0, 5.0),
        ]);
        let result = tree.knn(1, &XyzPoint::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|n| n.distance == 1.0));

        let result = tree.knn(4, &XyzPoint::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[3].distance, 5.0);
    }

    #[test]
    fn test_knn_scores_equal_points_in_distinct_nodes() {
        let p = XyzPoint::new(2.0, 2.0, 2.0);
        let tree = KdTree::build(vec![p, p, p, XyzPoint::new(9.0, 9.0, 9.0)]);
        let result = tree.knn(1, &p).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|n| n.distance == 0.0));
    }

    #[test]
    fn test_closer_point_evicts_all_tied_entries() {
        let mut set = NeighbourSet::new(1);
        for (i, distance) in [(0, 3.0), (1, 3.0), (2, 3.0)] {
            set.offer(Candidate {
                distance,
                position: XyzPoint::new(i as f64, 0.0, 0.0),
                id: NodeId(i),
            });
        }
        assert_eq!(set.entries.len(), 3);

        set.offer(Candidate {
            distance: 1.0,
            position: XyzPoint::new(9.0, 0.0, 0.0),
            id: NodeId(9),
        });
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.bound(), 1.0);
    }

    #[test]
    fn test_farther_point_rejected_when_full() {
        let mut set = NeighbourSet::new(1);
        set.offer(Candidate {
            distance: 1.0,
            position: XyzPoint::new(0.0, 0.0, 0.0),
            id: NodeId(0),
        });
        set.offer(Candidate {
            distance: 2.0,
            position: XyzPoint::new(1.0, 0.0, 0.0),
            id: NodeId(1),
        });
        assert_eq!(set.entries.len(), 1);
    }

    #[test]
    fn test_knn_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(99);
        let points: Vec<XyzPoint> = (0..300).map(|_| random_point(&mut rng)).collect();
        let tree = KdTree::build(points.clone());

        for _ in 0..50 {
            let query = random_point(&mut rng);
            for k in [1, 2, 5, 17] {
                let got: Vec<f64> = tree
                    .knn(k, &query)
                    .unwrap()
                    .iter()
                    .map(|n| n.distance)
                    .collect();
                assert_eq!(got, brute_force(&points, k, &query), "k = {k}");
            }
        }
    }

    #[test]
    fn test_results_sorted_nearest_first() {
        let tree = KdTree::build(vec![
            XyzPoint::new(5.0, 0.0, 0.0),
            XyzPoint::new(1.0, 0.0, 0.0),
            XyzPoint::new(3.0, 0.0, 0.0),
        ]);
        let result = tree.knn(3, &XyzPoint::new(0.0, 0.0, 0.0)).unwrap();
        let distances: Vec<f64> = result.iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![1.0, 3.0, 5.0]);
    }
}
