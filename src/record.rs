//! Parsing of `lat,lon[,timezone[,...]]` record lines.

use crate::compute::validation::validate_geographic_point;
use crate::error::{Result, TzError};
use geo::Point;
use nearest_tz_types::Location;

/// One parsed record line, borrowing from the original text.
///
/// A record is unlabelled when its timezone field is missing, empty, or equal to
/// the undefined marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    line: &'a str,
    coordinates: Point<f64>,
    timezone: Option<&'a str>,
}

impl<'a> Record<'a> {
    /// Parse a record line. `number` is only used for error reporting.
    ///
    /// # Examples
    ///
    /// ```
    /// use nearest_tz::record::Record;
    ///
    /// let record = Record::parse("48.85,2.35,Europe/Paris", "null", 1).unwrap();
    /// assert_eq!(record.timezone(), Some("Europe/Paris"));
    ///
    /// let record = Record::parse("50.0,5.0,null", "null", 2).unwrap();
    /// assert!(!record.is_labeled());
    /// assert_eq!(record.with_timezone("Europe/Brussels"), "50.0,5.0,Europe/Brussels");
    /// ```
    pub fn parse(line: &'a str, undefined_marker: &str, number: usize) -> Result<Self> {
        let malformed = |reason: String| TzError::MalformedRecord {
            line: number,
            reason,
        };

        let mut fields = line.splitn(4, ',');
        let latitude = parse_coordinate(fields.next(), "latitude").map_err(malformed)?;
        let longitude = parse_coordinate(fields.next(), "longitude").map_err(malformed)?;
        let coordinates = Point::new(longitude, latitude);
        validate_geographic_point(&coordinates).map_err(|e| TzError::MalformedRecord {
            line: number,
            reason: e.to_string(),
        })?;

        let timezone = fields
            .next()
            .map(str::trim)
            .filter(|tz| !tz.is_empty() && *tz != undefined_marker);

        Ok(Self {
            line,
            coordinates,
            timezone,
        })
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.y()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.x()
    }

    /// The parsed coordinates (x = longitude, y = latitude).
    pub fn coordinates(&self) -> Point<f64> {
        self.coordinates
    }

    pub fn timezone(&self) -> Option<&'a str> {
        self.timezone
    }

    pub fn is_labeled(&self) -> bool {
        self.timezone.is_some()
    }

    /// The record as a `Location`, carrying its label if it has one.
    pub fn to_location(&self) -> Location {
        match self.timezone {
            Some(tz) => Location::new(self.latitude(), self.longitude(), tz),
            None => Location::unlabeled(self.latitude(), self.longitude()),
        }
    }

    /// The original line with only the timezone field replaced by `timezone`.
    /// Lines without a timezone field get one appended.
    pub fn with_timezone(&self, timezone: &str) -> String {
        let mut fields: Vec<&str> = self.line.splitn(4, ',').collect();
        if fields.len() < 3 {
            fields.push(timezone);
        } else {
            fields[2] = timezone;
        }
        fields.join(",")
    }
}

fn parse_coordinate(field: Option<&str>, name: &str) -> std::result::Result<f64, String> {
    let field = field
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| format!("missing {}", name))?;
    field
        .parse::<f64>()
        .map_err(|e| format!("invalid {} '{}': {}", name, field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearest_tz_types::point::Cartesian;

    #[test]
    fn test_labeled_record() {
        let record = Record::parse("52.52,13.405,Europe/Berlin", "null", 1).unwrap();
        assert_eq!(record.latitude(), 52.52);
        assert_eq!(record.longitude(), 13.405);
        assert_eq!(record.timezone(), Some("Europe/Berlin"));
        assert!(record.is_labeled());
        assert_eq!(record.to_location().timezone(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_unlabeled_variants() {
        for line in ["1,2,null", "1,2", "1,2,", "1, 2 , null ,extra"] {
            let record = Record::parse(line, "null", 1).unwrap();
            assert!(!record.is_labeled(), "{line}");
        }
        let record = Record::parse("1,2,undefined", "undefined", 1).unwrap();
        assert!(!record.is_labeled());
        // the default marker is just a timezone name under another marker
        let record = Record::parse("1,2,null", "undefined", 1).unwrap();
        assert!(record.is_labeled());
    }

    #[test]
    fn test_substitution_keeps_other_fields() {
        let record = Record::parse("10.5,-3.25,null,device-42,extra", "null", 1).unwrap();
        assert_eq!(
            record.with_timezone("Africa/Abidjan"),
            "10.5,-3.25,Africa/Abidjan,device-42,extra"
        );

        let record = Record::parse("10.5,-3.25", "null", 1).unwrap();
        assert_eq!(record.with_timezone("Africa/Abidjan"), "10.5,-3.25,Africa/Abidjan");
    }

    #[test]
    fn test_marker_inside_other_fields_is_not_replaced() {
        let record = Record::parse("1,2,null,nullable", "null", 1).unwrap();
        assert_eq!(record.with_timezone("UTC"), "1,2,UTC,nullable");
    }

    #[test]
    fn test_malformed_records() {
        let err = Record::parse("abc,2,UTC", "null", 3).unwrap_err();
        assert!(matches!(err, TzError::MalformedRecord { line: 3, .. }));
        assert!(err.to_string().contains("invalid latitude"));

        let err = Record::parse("1.0", "null", 4).unwrap_err();
        assert!(err.to_string().contains("missing longitude"));

        let err = Record::parse("91,0,UTC", "null", 5).unwrap_err();
        assert!(err.to_string().contains("Latitude out of range"));

        assert!(Record::parse("", "null", 6).is_err());
        assert!(Record::parse("NaN,0,UTC", "null", 7).is_err());
    }

    #[test]
    fn test_coordinates_are_longitude_first() {
        let record = Record::parse("10.0,170.0,Pacific/Fiji", "null", 1).unwrap();
        assert_eq!(record.coordinates(), Point::new(170.0, 10.0));
        assert_eq!(record.to_location().coordinates(), &record.coordinates());

        // 170 is a valid longitude but not a valid latitude
        let err = Record::parse("170.0,10.0,Pacific/Fiji", "null", 2).unwrap_err();
        assert!(matches!(err, TzError::MalformedRecord { line: 2, .. }));
        assert!(err.to_string().contains("Latitude out of range"));
    }

    #[test]
    fn test_to_location_projects() {
        let record = Record::parse("0,90", "null", 1).unwrap();
        let location = record.to_location();
        assert!(location.timezone().is_none());
        assert!((location.xyz().y() - 6371.0).abs() < 1e-9);
    }
}
