//! Data errors raised by the feature pipeline and the index calculator.

use chrono::{DateTime, Utc};

/// Malformed, missing, or out-of-range input.
///
/// A `DataError` aborts the whole call: no partial table or partial score
/// is ever returned alongside it.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// The input series contained no observations.
    EmptySeries,
    /// Two observations share a timestamp (reported after sorting).
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
    /// A numeric field held NaN or an infinity.
    NonFinite {
        row: usize,
        timestamp: DateTime<Utc>,
        field: &'static str,
    },
    /// A categorical field was blank.
    MissingCategory {
        row: usize,
        timestamp: DateTime<Utc>,
        field: &'static str,
    },
    /// The water level falls outside the configured plausible range.
    WaterLevelOutOfRange { value: f64, min: f64, max: f64 },
    /// A sensor signal (anomaly score, data-gap factor) was not a finite number.
    InvalidSignal { field: &'static str, value: f64 },
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptySeries => write!(f, "empty series"),
            DataError::DuplicateTimestamp { index, timestamp } => write!(
                f,
                "unordered or duplicate timestamps: row {index} repeats {}",
                timestamp.to_rfc3339()
            ),
            DataError::NonFinite {
                row,
                timestamp,
                field,
            } => write!(
                f,
                "non-finite value in field '{field}' at row {row} ({})",
                timestamp.to_rfc3339()
            ),
            DataError::MissingCategory {
                row,
                timestamp,
                field,
            } => write!(
                f,
                "missing category in field '{field}' at row {row} ({})",
                timestamp.to_rfc3339()
            ),
            DataError::WaterLevelOutOfRange { value, min, max } => write!(
                f,
                "water level {value} m outside plausible range [{min}, {max}]"
            ),
            DataError::InvalidSignal { field, value } => {
                write!(f, "invalid signal '{field}': {value}")
            }
        }
    }
}

impl std::error::Error for DataError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        assert_eq!(DataError::EmptySeries.to_string(), "empty series");

        let ts = DateTime::parse_from_rfc3339("2020-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let err = DataError::DuplicateTimestamp {
            index: 4,
            timestamp: ts,
        };
        let msg = err.to_string();
        assert!(msg.contains("unordered or duplicate timestamps"));
        assert!(msg.contains("row 4"));
        assert!(msg.contains("2020-01-02"));

        let err = DataError::NonFinite {
            row: 7,
            timestamp: ts,
            field: "rainfall_mm",
        };
        assert!(err.to_string().contains("rainfall_mm"));
    }
}
