//! Feature engineering for the offline training table.
//!
//! Derives lag, rolling-sum and forward-difference fields from a station's
//! daily series and appends one-hot indicators for the categorical columns.
//! Every step is total: a malformed row aborts the whole transform.

use crate::config::{ConfigError, FeatureConfig};
use crate::core::encoding::EncodingVocabulary;
use crate::core::error::DataError;
use crate::core::observation::Observation;
use serde::{Deserialize, Serialize};

/// Derived column names, in output order.
pub const DERIVED_COLUMNS: [&str; 5] = [
    "prev_level",
    "rainfall_7",
    "rainfall_30",
    "pet_30",
    "target_recharge",
];

/// An observation with its derived fields and categorical indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRow {
    pub observation: Observation,
    /// Water level `lag` rows back
    pub prev_level: f64,
    /// Trailing rainfall sum over the short window
    pub rainfall_7: f64,
    /// Trailing rainfall sum over the long window
    pub rainfall_30: f64,
    /// Trailing PET sum over the long window
    pub pet_30: f64,
    /// Level `horizon` rows ahead minus the current level (0 when no such row)
    pub target_recharge: f64,
    /// One indicator per vocabulary column
    pub indicators: Vec<f64>,
}

/// Model-ready table: engineered rows plus the indicator column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineeredTable {
    pub indicator_columns: Vec<String>,
    pub rows: Vec<EngineeredRow>,
}

impl EngineeredTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full column header: observation fields, derived fields, indicators.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = [
            "timestamp",
            "water_level",
            "rainfall_mm",
            "pet_mm",
            "avg_temp_c",
            "lat",
            "lon",
            "elevation",
            "soil_type",
            "land_use",
        ]
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .map(|s| s.to_string())
        .collect();
        header.extend(self.indicator_columns.iter().cloned());
        header
    }

    /// One row rendered as strings matching [`EngineeredTable::header`].
    pub fn record(row: &EngineeredRow) -> Vec<String> {
        let obs = &row.observation;
        let mut record = vec![obs.timestamp.to_rfc3339()];
        record.extend(obs.numeric_fields().iter().map(|(_, v)| v.to_string()));
        record.push(obs.soil_type.clone());
        record.push(obs.land_use.clone());
        record.extend(
            [
                row.prev_level,
                row.rainfall_7,
                row.rainfall_30,
                row.pet_30,
                row.target_recharge,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        record.extend(row.indicators.iter().map(|v| v.to_string()));
        record
    }
}

/// Builds engineered tables from raw observation series.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Derive features and fit the encoding vocabulary on this series.
    pub fn fit_transform(
        &self,
        observations: Vec<Observation>,
    ) -> Result<(EngineeredTable, EncodingVocabulary), DataError> {
        let observations = prepare_series(observations)?;
        let vocabulary = EncodingVocabulary::fit(&observations);
        let table = self.derive(observations, &vocabulary);
        Ok((table, vocabulary))
    }

    /// Derive features for new data using a previously fitted vocabulary.
    pub fn transform(
        &self,
        observations: Vec<Observation>,
        vocabulary: &EncodingVocabulary,
    ) -> Result<EngineeredTable, DataError> {
        let observations = prepare_series(observations)?;
        Ok(self.derive(observations, vocabulary))
    }

    fn derive(
        &self,
        observations: Vec<Observation>,
        vocabulary: &EncodingVocabulary,
    ) -> EngineeredTable {
        let total = observations.len();
        let levels: Vec<f64> = observations.iter().map(|o| o.water_level).collect();
        let rainfall: Vec<f64> = observations.iter().map(|o| o.rainfall_mm).collect();
        let pet: Vec<f64> = observations.iter().map(|o| o.pet_mm).collect();

        let prev_level = lag(&levels, self.config.lag);
        let rainfall_7 = rolling_sum(&rainfall, self.config.short_window);
        let rainfall_30 = rolling_sum(&rainfall, self.config.long_window);
        let pet_30 = rolling_sum(&pet, self.config.long_window);
        let target = forward_difference(&levels, self.config.horizon);

        let rows: Vec<EngineeredRow> = observations
            .into_iter()
            .enumerate()
            .filter_map(|(i, observation)| {
                let indicators = vocabulary.encode(&observation);
                Some(EngineeredRow {
                    prev_level: prev_level[i]?,
                    rainfall_7: rainfall_7[i]?,
                    rainfall_30: rainfall_30[i]?,
                    pet_30: pet_30[i]?,
                    target_recharge: target[i],
                    indicators,
                    observation,
                })
            })
            .collect();

        if rows.is_empty() {
            tracing::warn!(
                input_rows = total,
                warm_up = self.config.warm_up_rows(),
                "series shorter than the warm-up period, no rows engineered"
            );
        } else {
            tracing::info!(
                input_rows = total,
                output_rows = rows.len(),
                indicator_columns = vocabulary.width(),
                "feature engineering complete"
            );
        }

        EngineeredTable {
            indicator_columns: vocabulary.column_names(),
            rows,
        }
    }
}

/// Sort ascending by timestamp and validate every row.
fn prepare_series(mut observations: Vec<Observation>) -> Result<Vec<Observation>, DataError> {
    if observations.is_empty() {
        return Err(DataError::EmptySeries);
    }

    observations.sort_by_key(|o| o.timestamp);

    for (index, pair) in observations.windows(2).enumerate() {
        if pair[0].timestamp == pair[1].timestamp {
            return Err(DataError::DuplicateTimestamp {
                index: index + 1,
                timestamp: pair[1].timestamp,
            });
        }
    }

    for (row, obs) in observations.iter().enumerate() {
        if let Some(&(field, _)) = obs.numeric_fields().iter().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::NonFinite {
                row,
                timestamp: obs.timestamp,
                field,
            });
        }
        if let Some(&(field, _)) = obs
            .categorical_fields()
            .iter()
            .find(|(_, v)| v.trim().is_empty())
        {
            return Err(DataError::MissingCategory {
                row,
                timestamp: obs.timestamp,
                field,
            });
        }
    }

    Ok(observations)
}

/// Value `k` positions back; `None` for the first `k` rows.
pub fn lag(values: &[f64], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(k).map(|j| values[j]))
        .collect()
}

/// Trailing inclusive sum over `window` rows; `None` until the window is full.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                Some(values[i + 1 - window..=i].iter().sum())
            }
        })
        .collect()
}

/// `values[i + horizon] - values[i]`, defaulting to zero past the end.
///
/// The zero default is a substitute for a missing future value, not a
/// measured change; it is kept for compatibility with existing training data.
pub fn forward_difference(values: &[f64], horizon: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            values
                .get(i + horizon)
                .map(|future| future - values[i])
                .unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(len: usize) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| Observation {
                timestamp: start + Duration::days(i as i64),
                water_level: 50.0 + i as f64,
                rainfall_mm: 1.0,
                pet_mm: 0.5,
                avg_temp_c: 25.0,
                lat: 10.0,
                lon: 78.0,
                elevation: 200.0,
                soil_type: ["Clay", "Sand", "Loam"][i % 3].to_string(),
                land_use: ["Agri", "Urban"][i % 2].to_string(),
            })
            .collect()
    }

    fn engineer() -> FeatureEngineer {
        FeatureEngineer::new(FeatureConfig::default()).unwrap()
    }

    #[test]
    fn test_lag() {
        assert_eq!(lag(&[1.0, 2.0, 3.0], 1), vec![None, Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_rolling_sum_warm_up() {
        let sums = rolling_sum(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(sums, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn test_forward_difference_defaults_to_zero() {
        let diffs = forward_difference(&[1.0, 4.0, 9.0], 2);
        assert_eq!(diffs, vec![8.0, 0.0, 0.0]);
    }

    #[test]
    fn test_output_drops_warm_up_rows() {
        let (table, vocab) = engineer().fit_transform(series(100)).unwrap();
        assert_eq!(table.len(), 100 - 29);
        assert_eq!(vocab.width(), 5);
        assert_eq!(table.indicator_columns.len(), 5);
        for row in &table.rows {
            assert_eq!(row.indicators.len(), 5);
        }
    }

    #[test]
    fn test_constant_rainfall_sums() {
        let (table, _) = engineer().fit_transform(series(40)).unwrap();
        let first = &table.rows[0];
        assert_eq!(first.rainfall_30, 30.0);
        assert_eq!(first.rainfall_7, 7.0);
        assert_eq!(first.pet_30, 15.0);
        // first fully-windowed row is day 30 (index 29)
        assert_eq!(first.observation.water_level, 79.0);
        assert_eq!(first.prev_level, 78.0);
    }

    #[test]
    fn test_target_recharge_forward_difference() {
        let (table, _) = engineer().fit_transform(series(100)).unwrap();
        // index 29 looks ahead to index 59: +30 m
        assert_eq!(table.rows[0].target_recharge, 30.0);
        // last 30 rows have nothing ahead
        assert!(table.rows.iter().rev().take(30).all(|r| r.target_recharge == 0.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut rows = series(40);
        rows.reverse();
        let (table, _) = engineer().fit_transform(rows).unwrap();
        let stamps: Vec<_> = table.rows.iter().map(|r| r.observation.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let mut rows = series(40);
        rows[10].timestamp = rows[9].timestamp;
        let err = engineer().fit_transform(rows).unwrap_err();
        assert!(matches!(err, DataError::DuplicateTimestamp { index: 10, .. }));
        assert!(err.to_string().contains("unordered or duplicate timestamps"));
    }

    #[test]
    fn test_empty_series_rejected() {
        assert_eq!(
            engineer().fit_transform(Vec::new()).unwrap_err(),
            DataError::EmptySeries
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut rows = series(40);
        rows[5].pet_mm = f64::NAN;
        let err = engineer().fit_transform(rows).unwrap_err();
        assert!(matches!(
            err,
            DataError::NonFinite {
                row: 5,
                field: "pet_mm",
                ..
            }
        ));
    }

    #[test]
    fn test_short_series_yields_empty_table() {
        let (table, _) = engineer().fit_transform(series(10)).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_transform_reuses_vocabulary() {
        let (_, vocab) = engineer().fit_transform(series(60)).unwrap();

        let mut unseen = series(40);
        for obs in &mut unseen {
            obs.soil_type = "Peat".to_string();
        }
        let table = engineer().transform(unseen, &vocab).unwrap();

        assert_eq!(table.indicator_columns, vocab.column_names());
        for row in &table.rows {
            assert_eq!(vocab.decode("soil_type", &row.indicators), None);
            assert!(vocab.decode("land_use", &row.indicators).is_some());
        }
    }

    #[test]
    fn test_header_matches_record_width() {
        let (table, _) = engineer().fit_transform(series(40)).unwrap();
        let header = table.header();
        assert_eq!(header.len(), EngineeredTable::record(&table.rows[0]).len());
        assert_eq!(header[10], "prev_level");
    }
}
