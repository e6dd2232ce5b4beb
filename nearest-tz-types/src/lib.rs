//! # nearest-tz-types
//!
//! Point types shared by the nearest-tz index and its batch tooling.
//!
//! - **`XyzPoint`**: a latitude/longitude pair projected onto a sphere as
//!   Cartesian `(x, y, z)` kilometres
//! - **`Location`**: an `XyzPoint` carrying its original coordinates and an
//!   optional timezone label
//! - **`Cartesian`**: the trait the k-d tree is generic over
//!
//! ## Examples
//!
//! ```rust
//! use nearest_tz_types::location::Location;
//! use nearest_tz_types::point::{Cartesian, XyzPoint};
//!
//! let berlin = Location::new(52.52, 13.405, "Europe/Berlin");
//! let paris = XyzPoint::from_lat_lon(48.85, 2.35);
//!
//! let km = berlin.xyz().distance(&paris);
//! assert!(km > 800.0 && km < 900.0);
//! ```

pub mod location;
pub mod point;

pub use location::Location;
pub use point::{Cartesian, EARTH_RADIUS_KM, XyzPoint};
