use super::KdTree;
use super::node::{NodeId, Side};
use std::iter::FusedIterator;

/// Iterator over the points of a [`KdTree`].
///
/// Visits, for every node, the whole subtree on its `first` side, then the node,
/// then the subtree on the other side. Created by [`KdTree::iter`] and
/// [`KdTree::iter_rev`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    tree: &'a KdTree<T>,
    stack: Vec<NodeId>,
    first: Side,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(tree: &'a KdTree<T>, first: Side) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            first,
            remaining: tree.len(),
        };
        iter.descend(tree.root());
        iter
    }

    fn descend(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.stack.push(id);
            current = self.tree.node(id).child(self.first);
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.node(id);
        self.descend(node.child(self.first.opposite()));
        self.remaining -= 1;
        Some(&node.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
