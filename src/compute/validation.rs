//! Validation for geographic coordinates and projected points.

use crate::error::{Result, TzError};
use geo::Point;
use nearest_tz_types::point::XyzPoint;

/// Validates a latitude/longitude pair in degrees.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use nearest_tz::compute::validation::validate_lat_lon;
///
/// assert!(validate_lat_lon(52.52, 13.405).is_ok());
/// assert!(validate_lat_lon(95.0, 0.0).is_err());
/// assert!(validate_lat_lon(0.0, f64::NAN).is_err());
/// ```
pub fn validate_lat_lon(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() {
        return Err(TzError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            latitude
        )));
    }

    if !longitude.is_finite() {
        return Err(TzError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            longitude
        )));
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(TzError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            latitude
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(TzError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            longitude
        )));
    }

    Ok(())
}

/// Validates a `geo::Point` holding longitude (x) and latitude (y).
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    validate_lat_lon(point.y(), point.x())
}

/// Validates that a projected point can be placed in or searched against an index.
pub fn validate_cartesian(point: &XyzPoint) -> Result<()> {
    if !point.is_finite() {
        return Err(TzError::InvalidInput(format!(
            "Point coordinates must be finite, got: {}",
            point
        )));
    }
    Ok(())
}
