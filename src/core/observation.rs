//! Observation records shared by the offline pipeline and the live scorer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row of a station's time-indexed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the reading was taken
    #[serde(with = "timestamp_serde")]
    pub timestamp: DateTime<Utc>,
    /// Water level in meters
    pub water_level: f64,
    /// Daily rainfall in millimeters
    pub rainfall_mm: f64,
    /// Daily potential evapotranspiration in millimeters
    pub pet_mm: f64,
    /// Average daily air temperature in degrees Celsius
    pub avg_temp_c: f64,
    pub lat: f64,
    pub lon: f64,
    /// Station elevation in meters
    pub elevation: f64,
    pub soil_type: String,
    pub land_use: String,
}

impl Observation {
    /// Numeric fields paired with their column names, in schema order.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 7] {
        [
            ("water_level", self.water_level),
            ("rainfall_mm", self.rainfall_mm),
            ("pet_mm", self.pet_mm),
            ("avg_temp_c", self.avg_temp_c),
            ("lat", self.lat),
            ("lon", self.lon),
            ("elevation", self.elevation),
        ]
    }

    /// Categorical fields paired with their column names.
    pub fn categorical_fields(&self) -> [(&'static str, &str); 2] {
        [
            ("soil_type", self.soil_type.as_str()),
            ("land_use", self.land_use.as_str()),
        ]
    }
}

/// Per-tick signals that accompany a live reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSignals {
    /// Anomaly detector output (0-1 in practice, any real accepted)
    pub anomaly_score: f64,
    /// Estimated share of missing or jittered samples
    pub data_gap_factor: f64,
}

impl SensorSignals {
    pub fn new(anomaly_score: f64, data_gap_factor: f64) -> Self {
        Self {
            anomaly_score,
            data_gap_factor,
        }
    }
}

/// Parse a timestamp written either as RFC 3339 or as a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Serde support for timestamps in CSV and JSON.
pub(crate) mod timestamp_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
