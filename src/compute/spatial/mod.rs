//! Spatial indexing: axis comparators and the 3D k-d tree.

pub mod axis;
pub mod kdtree;

pub use axis::Axis;
pub use kdtree::{KdTree, Neighbour};
