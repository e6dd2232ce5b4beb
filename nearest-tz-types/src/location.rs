use crate::point::{Cartesian, EARTH_RADIUS_KM, XyzPoint};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean radius geo's `Haversine` measures on, in metres.
const HAVERSINE_RADIUS_M: f64 = 6_371_008.8;

/// A geographic coordinate with an optional timezone label.
///
/// The coordinate is projected onto the Earth sphere once at construction; the
/// original longitude/latitude are kept alongside as a `geo::Point`
/// (x = longitude, y = latitude).
///
/// # Examples
///
/// ```
/// use nearest_tz_types::location::Location;
///
/// let berlin = Location::new(52.52, 13.405, "Europe/Berlin");
/// assert_eq!(berlin.timezone(), Some("Europe/Berlin"));
///
/// let unknown = Location::unlabeled(50.0, 5.0);
/// assert!(unknown.timezone().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    position: XyzPoint,
    coordinates: Point<f64>,
    timezone: Option<String>,
}

impl Location {
    /// Create a labelled location.
    pub fn new(latitude: f64, longitude: f64, timezone: impl Into<String>) -> Self {
        Self::with_label(latitude, longitude, Some(timezone.into()))
    }

    /// Create a location whose timezone is not known yet.
    pub fn unlabeled(latitude: f64, longitude: f64) -> Self {
        Self::with_label(latitude, longitude, None)
    }

    fn with_label(latitude: f64, longitude: f64, timezone: Option<String>) -> Self {
        Self {
            position: XyzPoint::from_lat_lon(latitude, longitude),
            coordinates: Point::new(longitude, latitude),
            timezone,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.y()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.x()
    }

    /// The original coordinates as a `geo::Point` (x = longitude, y = latitude).
    pub fn coordinates(&self) -> &Point<f64> {
        &self.coordinates
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// Haversine distance to another location in kilometres, on the same sphere
    /// the Cartesian projection uses.
    pub fn great_circle_km(&self, other: &Location) -> f64 {
        let metres = Haversine.distance(self.coordinates, other.coordinates);
        metres / HAVERSINE_RADIUS_M * EARTH_RADIUS_KM
    }
}

impl Cartesian for Location {
    fn xyz(&self) -> &XyzPoint {
        &self.position
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Location{{timezone='{}' point='{}'}}",
            self.timezone.as_deref().unwrap_or("-"),
            self.position
        )
    }
}
