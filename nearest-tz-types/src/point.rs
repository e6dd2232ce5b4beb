use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Earth's mean radius in kilometres, the sphere every geographic point is projected onto.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point in 3D Cartesian space, usually a latitude/longitude projected onto a sphere.
///
/// Coordinates are derived once at construction and never change. Equality and
/// ordering look only at `(x, y, z)`, so any payload wrapped around the point is
/// irrelevant to how it is placed or found in an index.
///
/// The straight-line (chord) distance between two projected points grows
/// monotonically with their great-circle distance, which makes it a cheap stand-in
/// for geodesic proximity at the scales the index targets.
///
/// # Examples
///
/// ```
/// use nearest_tz_types::point::{EARTH_RADIUS_KM, XyzPoint};
///
/// let a = XyzPoint::from_lat_lon(0.0, 0.0);
/// let b = XyzPoint::from_lat_lon(0.0, 90.0);
/// let expected = EARTH_RADIUS_KM * 2f64.sqrt();
/// assert!((a.distance(&b) - expected).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XyzPoint {
    x: f64,
    y: f64,
    z: f64,
}

impl XyzPoint {
    /// Create a point from raw Cartesian coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Project a latitude/longitude (degrees) onto the Earth sphere.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Self::from_radius_lat_lon(EARTH_RADIUS_KM, latitude, longitude)
    }

    /// Project a latitude/longitude (degrees) onto a sphere of radius `r`.
    pub fn from_radius_lat_lon(r: f64, latitude: f64, longitude: f64) -> Self {
        let lat = latitude.to_radians();
        let lon = longitude.to_radians();
        Self {
            x: r * lat.cos() * lon.cos(),
            y: r * lat.cos() * lon.sin(),
            z: r * lat.sin(),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Returns true when all three coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &XyzPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Total order over `(x, y, z)`: x first, then y, then z.
    ///
    /// Each coordinate is compared with `<` and `>`; anything else counts as equal
    /// and the next coordinate decides.
    pub fn compare(&self, other: &XyzPoint) -> Ordering {
        compare_coord(self.x, other.x)
            .then_with(|| compare_coord(self.y, other.y))
            .then_with(|| compare_coord(self.z, other.z))
    }
}

impl PartialEq for XyzPoint {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl fmt::Display for XyzPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Compare two coordinates with `<` / `>`, treating everything else as equal.
#[inline]
pub fn compare_coord(a: f64, b: f64) -> Ordering {
    if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Anything that occupies a position in 3D Cartesian space.
///
/// The k-d tree is generic over this trait; whatever else the implementor carries
/// is an opaque payload as far as the index is concerned.
pub trait Cartesian {
    fn xyz(&self) -> &XyzPoint;
}

impl Cartesian for XyzPoint {
    fn xyz(&self) -> &XyzPoint {
        self
    }
}
