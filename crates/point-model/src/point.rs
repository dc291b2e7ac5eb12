//! Point observations.
//!
//! A point is one geographic detection with a UTC timestamp and an optional
//! weight. Points are stored in JSONL form, one object per line:
//!
//! ```text
//! {"lat":38.51,"lon":-122.47,"t":"2024-08-01T12:00:00Z","value":1.0}
//! ```
//!
//! `t` may also be given as a number of Unix seconds.

use chrono::{DateTime, Utc};
use geoprojector_common::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

/// Weight applied when a point carries no explicit value.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A single timestamped geographic observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in degrees, [-90, 90].
    #[serde(rename = "lat", alias = "latitude")]
    pub latitude: f64,

    /// Longitude in degrees, [-180, 180].
    #[serde(rename = "lon", alias = "longitude")]
    pub longitude: f64,

    /// Observation time.
    #[serde(rename = "t", alias = "timestamp", with = "timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Optional numeric weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Point {
    /// Create an unweighted point.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            value: None,
        }
    }

    /// Attach an explicit weight.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Value added to a grid cell when this point is accumulated.
    pub fn weight(&self) -> f64 {
        self.value.unwrap_or(DEFAULT_WEIGHT)
    }

    /// Check coordinate ranges and value finiteness.
    ///
    /// `index` identifies the record in error messages.
    pub fn validate(&self, index: usize) -> GeoResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::malformed(
                index,
                format!("latitude {} outside [-90, 90]", self.latitude),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::malformed(
                index,
                format!("longitude {} outside [-180, 180]", self.longitude),
            ));
        }
        if let Some(value) = self.value {
            if !value.is_finite() {
                return Err(GeoError::malformed(
                    index,
                    format!("value {value} is not finite"),
                ));
            }
        }
        Ok(())
    }
}

/// Convert fractional Unix seconds to a UTC timestamp.
pub fn from_unix_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        UnixSecs(f64),
    }

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(d)? {
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
            RawTimestamp::UnixSecs(secs) => super::from_unix_secs(secs)
                .ok_or_else(|| D::Error::custom(format!("timestamp {secs} out of range"))),
        }
    }
}

/// Parse points from JSONL content (one JSON object per line).
///
/// Blank lines and `#` comment lines are skipped. Errors carry the 1-based
/// line number. Parsed points are validated.
pub fn parse_points(jsonl: &str) -> GeoResult<Vec<Point>> {
    let mut points = Vec::new();
    for (idx, line) in jsonl.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;
        let point: Point =
            serde_json::from_str(line).map_err(|e| GeoError::malformed(line_no, e.to_string()))?;
        point.validate(line_no)?;
        points.push(point);
    }
    Ok(points)
}

/// Serialize points to JSONL format.
pub fn serialize_points(points: &[Point]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for point in points {
        output.push_str(&serde_json::to_string(point)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let point = Point::new(10.0, 20.0, at(0));
        assert_eq!(point.weight(), 1.0);
        assert_eq!(point.with_value(2.5).weight(), 2.5);
    }

    #[test]
    fn test_json_format() {
        let point = Point::new(38.5, -122.25, at(1_722_513_600)).with_value(2.0);
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"lat\":38.5"));
        assert!(json.contains("\"lon\":-122.25"));
        assert!(json.contains("\"t\":\"2024-08-01T12:00:00Z\""));
        assert!(json.contains("\"value\":2.0"));

        let unweighted = serde_json::to_string(&Point::new(0.0, 0.0, at(0))).unwrap();
        assert!(!unweighted.contains("value"));
    }

    #[test]
    fn test_timestamp_accepts_unix_seconds() {
        let parsed: Point = serde_json::from_str(r#"{"lat":1.0,"lon":2.0,"t":90}"#).unwrap();
        assert_eq!(parsed.timestamp, at(90));

        let fractional: Point =
            serde_json::from_str(r#"{"lat":1.0,"lon":2.0,"t":1.5}"#).unwrap();
        assert_eq!(fractional.timestamp.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_long_field_names_are_accepted() {
        let parsed: Point = serde_json::from_str(
            r#"{"latitude":1.0,"longitude":2.0,"timestamp":"1970-01-01T00:01:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed, Point::new(1.0, 2.0, at(60)));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(Point::new(90.0, 180.0, at(0)).validate(0).is_ok());

        let err = Point::new(91.0, 0.0, at(0)).validate(7).unwrap_err();
        assert!(matches!(err, GeoError::MalformedPoint { index: 7, .. }));

        assert!(Point::new(0.0, -181.0, at(0)).validate(0).is_err());
        assert!(Point::new(f64::NAN, 0.0, at(0)).validate(0).is_err());
        assert!(Point::new(0.0, 0.0, at(0))
            .with_value(f64::INFINITY)
            .validate(0)
            .is_err());
    }

    #[test]
    fn test_parse_points_skips_comments_and_reports_lines() {
        let jsonl = "# fire detections\n\n{\"lat\":1.0,\"lon\":1.0,\"t\":0}\n{\"lat\":2.0,\"lon\":2.0,\"t\":60}\n";
        let points = parse_points(jsonl).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].timestamp, at(60));

        let bad = "{\"lat\":1.0,\"lon\":1.0,\"t\":0}\n{\"lat\":1.0,\"t\":0}\n";
        match parse_points(bad).unwrap_err() {
            GeoError::MalformedPoint { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }

        let out_of_range = "{\"lat\":100.0,\"lon\":1.0,\"t\":0}\n";
        assert!(parse_points(out_of_range).is_err());
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let points = vec![
            Point::new(0.5, 0.5, at(1)),
            Point::new(1.5, 1.5, at(2)).with_value(2.0),
        ];
        let jsonl = serialize_points(&points).unwrap();
        assert_eq!(parse_points(&jsonl).unwrap(), points);
    }
}
