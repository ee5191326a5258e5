use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of the input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRow {
    pub source_zip: String,
    pub source_country: String,
    pub destination_zip: String,
    pub destination_country: String,
}

/// A country code that passed the allow-list check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Trims and uppercases without checking any allow-list.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", from = "[f64; 2]")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.latitude, c.longitude]
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub place_name: String,
    pub country_code: CountryCode,
}

impl ResolvedPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Raw entry from an offline postal table. Coordinates may be absent in the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct PostalEntry {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_name: String,
}

/// An ordered polyline with at least two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RouteLine(Vec<Coordinate>);

impl RouteLine {
    pub fn new(points: Vec<Coordinate>) -> Option<Self> {
        if points.len() < 2 {
            None
        } else {
            Some(Self(points))
        }
    }

    pub fn between(from: Coordinate, to: Coordinate) -> Self {
        Self(vec![from, to])
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub row_number: usize,
    pub source_zip: String,
    pub source_country: String,
    pub destination_zip: String,
    pub destination_country: String,
    pub error: String,
}

impl FailureRecord {
    /// `index` is the zero-based data row; the header occupies line 1.
    pub fn from_row(index: usize, row: &RouteRow, error: impl fmt::Display) -> Self {
        Self {
            row_number: index + 2,
            source_zip: row.source_zip.clone(),
            source_country: row.source_country.clone(),
            destination_zip: row.destination_zip.clone(),
            destination_country: row.destination_country.clone(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub map_path: String,
    pub failure_path: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalized() {
        assert_eq!(CountryCode::normalized("  ch ").as_str(), "CH");
        assert_eq!(CountryCode::normalized("").as_str(), "");
    }

    #[test]
    fn test_coordinate_serializes_as_lat_lon_pair() {
        let json = serde_json::to_string(&Coordinate::new(47.0, 9.5)).unwrap();
        assert_eq!(json, "[47.0,9.5]");
    }

    #[test]
    fn test_route_line_requires_two_points() {
        assert!(RouteLine::new(vec![Coordinate::new(47.0, 9.0)]).is_none());
        let line = RouteLine::new(vec![Coordinate::new(47.0, 9.0), Coordinate::new(47.5, 9.5)])
            .unwrap();
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn test_failure_record_row_number_accounts_for_header() {
        let row = RouteRow {
            source_zip: "8001".to_string(),
            source_country: "XX".to_string(),
            destination_zip: "3000".to_string(),
            destination_country: "CH".to_string(),
        };
        let record = FailureRecord::from_row(1, &row, "Invalid country code: 'XX'");
        assert_eq!(record.row_number, 3);
        assert_eq!(record.source_country, "XX");
        assert_eq!(record.error, "Invalid country code: 'XX'");
    }
}
