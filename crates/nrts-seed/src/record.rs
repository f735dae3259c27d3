//! Bootstrap record types.
//!
//! This module defines the sample land application document that the seeder
//! guarantees is present, along with its identifier and coordinate types.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of the built-in test application.
pub const TEST_APPLICATION_ID: &str = "69850c237f00b0a3ef284d0c";

fn object_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{24}$").expect("static pattern is valid"))
}

/// A stable record identifier in object id form (24 lowercase hex characters).
///
/// Identifiers are fixed when a seed record is authored, never generated per run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Parse an identifier, accepting either hex case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecordId`] if the value is not 24 hex characters.
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if object_id_pattern().is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::InvalidRecordId(value.to_string()))
        }
    }

    /// The identifier as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// A geographic coordinate, serialized as `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Centroid {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl Centroid {
    /// Create a centroid from longitude and latitude.
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<[f64; 2]> for Centroid {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Centroid> for [f64; 2] {
    fn from(centroid: Centroid) -> Self {
        [centroid.longitude, centroid.latitude]
    }
}

/// The sample land application document ensured by the seeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRecord {
    /// Stable identifier.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Human-readable name.
    pub name: String,
    /// Lifecycle label, e.g. `Active`.
    pub status: String,
    /// Responsible agency.
    pub agency: String,
    /// Applicant.
    pub client: String,
    /// Region description.
    pub location: String,
    /// Purpose of the application.
    pub purpose: String,
    /// Label groups.
    pub tags: Vec<Vec<String>>,
    /// Area in hectares.
    pub area_hectares: f64,
    /// When the application was created.
    pub created_date: DateTime<Utc>,
    /// When the application was published.
    pub publish_date: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Geographic centroid.
    pub centroid: Centroid,
}

impl BootstrapRecord {
    /// The built-in test Crown Land application.
    #[must_use]
    pub fn test_application() -> Self {
        Self {
            id: RecordId(TEST_APPLICATION_ID.to_string()),
            name: "Test Crown Land Application".to_string(),
            status: "Active".to_string(),
            agency: "Ministry of Example".to_string(),
            client: "Test Client Corp".to_string(),
            location: "British Columbia".to_string(),
            purpose: "Land development test application".to_string(),
            tags: vec![vec!["public".to_string()]],
            area_hectares: 150.5,
            created_date: utc_midnight(2024, 1, 15),
            publish_date: utc_midnight(2024, 1, 20),
            is_deleted: false,
            centroid: Centroid::new(-120.5, 49.5),
        }
    }

    /// Load a record from a JSON file using the document field names.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or the
    /// record fails validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::RecordFile {
            path: path.to_path_buf(),
            source,
        })?;
        let record: Self = serde_json::from_str(&contents)?;
        record.validate()?;
        Ok(record)
    }

    /// Validate the record's field values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_record("name must not be empty"));
        }

        if !self.area_hectares.is_finite() || self.area_hectares < 0.0 {
            return Err(Error::invalid_record(format!(
                "areaHectares must be a non-negative number, got {}",
                self.area_hectares
            )));
        }

        let Centroid {
            longitude,
            latitude,
        } = self.centroid;
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::invalid_record(format!(
                "centroid longitude {longitude} is outside [-180, 180]"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::invalid_record(format!(
                "centroid latitude {latitude} is outside [-90, 90]"
            )));
        }

        Ok(())
    }
}

/// Only called with the literal's fixed calendar dates.
fn utc_midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("seed dates are valid calendar dates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_midnight() {
        assert_eq!(
            utc_midnight(2024, 1, 15).to_rfc3339(),
            "2024-01-15T00:00:00+00:00"
        );
    }

    #[test]
    #[should_panic(expected = "valid calendar dates")]
    fn test_utc_midnight_rejects_impossible_date() {
        let _ = utc_midnight(2024, 2, 30);
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::parse(TEST_APPLICATION_ID).unwrap();
        assert_eq!(id.as_str(), TEST_APPLICATION_ID);
        assert_eq!(id.to_string(), TEST_APPLICATION_ID);
    }

    #[test]
    fn test_record_id_normalizes_case() {
        let id = RecordId::parse("69850C237F00B0A3EF284D0C").unwrap();
        assert_eq!(id.as_str(), TEST_APPLICATION_ID);
    }

    #[test]
    fn test_record_id_rejects_bad_values() {
        assert!(RecordId::parse("").is_err());
        assert!(RecordId::parse("69850c237f00b0a3ef284d0").is_err());
        assert!(RecordId::parse("69850c237f00b0a3ef284d0z").is_err());
        assert!(RecordId::parse("69850c237f00b0a3ef284d0c00").is_err());
    }

    #[test]
    fn test_test_application_values() {
        let record = BootstrapRecord::test_application();
        assert_eq!(record.id.as_str(), TEST_APPLICATION_ID);
        assert_eq!(record.status, "Active");
        assert_eq!(record.tags, vec![vec!["public".to_string()]]);
        assert!((record.area_hectares - 150.5).abs() < f64::EPSILON);
        assert_eq!(record.centroid, Centroid::new(-120.5, 49.5));
        assert_eq!(record.created_date.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(record.publish_date.to_rfc3339(), "2024-01-20T00:00:00+00:00");
        assert!(!record.is_deleted);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_serializes_document_field_names() {
        let json = serde_json::to_value(BootstrapRecord::test_application()).unwrap();
        assert_eq!(json["_id"], TEST_APPLICATION_ID);
        assert_eq!(json["areaHectares"], 150.5);
        assert_eq!(json["isDeleted"], false);
        assert_eq!(json["centroid"], serde_json::json!([-120.5, 49.5]));
        assert_eq!(json["tags"], serde_json::json!([["public"]]));
        assert!(json.get("publishDate").is_some());
        assert!(json.get("area_hectares").is_none());
    }

    #[test]
    fn test_deserialize_rejects_invalid_id() {
        let mut json = serde_json::to_value(BootstrapRecord::test_application()).unwrap();
        json["_id"] = serde_json::json!("not-an-object-id");
        let result: std::result::Result<BootstrapRecord, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_negative_area() {
        let mut record = BootstrapRecord::test_application();
        record.area_hectares = -1.0;
        let err = record.validate().unwrap_err().to_string();
        assert!(err.contains("areaHectares"));
    }

    #[test]
    fn test_validate_nan_area() {
        let mut record = BootstrapRecord::test_application();
        record.area_hectares = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_centroid_order_matters() {
        let mut record = BootstrapRecord::test_application();
        // Swapped pair: latitude -120.5 is out of range.
        record.centroid = Centroid::new(49.5, -120.5);
        let err = record.validate().unwrap_err().to_string();
        assert!(err.contains("latitude"));
    }

    #[test]
    fn test_validate_empty_name() {
        let mut record = BootstrapRecord::test_application();
        record.name = "  ".to_string();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let mut record = BootstrapRecord::test_application();
        record.name = "Loaded Application".to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&record).unwrap()).unwrap();

        let loaded = BootstrapRecord::from_json_file(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = BootstrapRecord::from_json_file("/nonexistent/record.json");
        assert!(matches!(result, Err(Error::RecordFile { .. })));
    }
}
