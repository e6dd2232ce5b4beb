//! Nearest-neighbour timezone resolution over a 3D k-d tree.
//!
//! Latitude/longitude pairs are projected onto a sphere of radius 6371 km and
//! indexed in a [`KdTree`]. Records without a timezone borrow the label of the
//! nearest labelled record when it lies within a distance threshold.
//!
//! ```rust
//! use nearest_tz::{KdTree, Location};
//!
//! let tree = KdTree::build(vec![
//!     Location::new(52.52, 13.405, "Europe/Berlin"),
//!     Location::new(48.85, 2.35, "Europe/Paris"),
//! ]);
//! let query = Location::unlabeled(50.0, 5.0);
//! let nearest = tree.nearest(&query)?.unwrap();
//! assert_eq!(nearest.point.timezone(), Some("Europe/Paris"));
//! # Ok::<(), nearest_tz::TzError>(())
//! ```

pub mod batch;
pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod reader;
pub mod record;

pub use batch::{BatchReport, BatchStats, Partition, Resolver, process_file, write_partitions};
pub use builder::ResolverBuilder;
pub use compute::spatial::{KdTree, Neighbour};
pub use config::{Config, ThresholdMetric};
pub use error::{Result, TzError};
pub use record::Record;

pub use nearest_tz_types::{Cartesian, EARTH_RADIUS_KM, Location, XyzPoint};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Cartesian, KdTree, Location, Neighbour, XyzPoint};

    pub use crate::{Config, Result, ResolverBuilder, ThresholdMetric, TzError};
}
