//! Human-readable dump of the tree structure, for debugging.

use super::KdTree;
use super::node::NodeId;
use nearest_tz_types::point::Cartesian;
use std::fmt;

impl<T: Cartesian> fmt::Display for KdTree<T> {
    /// Renders one line per node, children indented under their parent:
    ///
    /// ```text
    /// └── depth=0 id=(2, 0, 0)
    ///     ├── [left] depth=1 id=(1, 0, 0)
    ///     └── [right] depth=1 id=(3, 0, 0)
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root() else {
            return writeln!(f, "Tree has no nodes.");
        };

        let mut pending: Vec<(NodeId, String, bool)> = vec![(root, String::new(), true)];
        while let Some((id, prefix, is_tail)) = pending.pop() {
            let node = self.node(id);
            let connector = if is_tail { "└── " } else { "├── " };
            let side = match node.parent {
                Some(parent) if self.node(parent).greater == Some(id) => "[right] ",
                Some(_) => "[left] ",
                None => "",
            };
            writeln!(
                f,
                "{prefix}{connector}{side}depth={} id={}",
                node.depth,
                node.point.xyz()
            )?;

            let child_prefix = format!("{prefix}{}", if is_tail { "    " } else { "│   " });
            let children: Vec<NodeId> = node.lesser.into_iter().chain(node.greater).collect();
            // pushed in reverse so the lesser child prints first
            for (i, child) in children.iter().enumerate().rev() {
                pending.push((*child, child_prefix.clone(), i + 1 == children.len()));
            }
        }
        Ok(())
    }
}
