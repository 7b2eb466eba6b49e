//! One-hot encoding of the categorical station attributes.
//!
//! The vocabulary is fit once from a training table and then reused for every
//! later transform, so the indicator column set never changes between runs.
//! Categories that were not seen at fit time encode to all-zero indicators.

use crate::core::observation::Observation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Categorical columns that receive indicator columns, in output order.
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["soil_type", "land_use"];

/// The categories observed for a single categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    /// Source column name (e.g. `soil_type`)
    pub name: String,
    /// Observed categories in indicator order (sorted when fitted; a loaded
    /// vocabulary keeps its stored order)
    pub categories: Vec<String>,
}

impl CategoricalFeature {
    /// Indicator column name for one category, e.g. `soil_type_Clay`.
    pub fn column_name(&self, category: &str) -> String {
        format!("{}_{}", self.name, category)
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }
}

/// Fitted mapping from categorical value to indicator column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodingVocabulary {
    pub features: Vec<CategoricalFeature>,
}

impl EncodingVocabulary {
    /// Fit the vocabulary from the rows present in `observations` only.
    pub fn fit(observations: &[Observation]) -> Self {
        let features = CATEGORICAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let categories: BTreeSet<&str> = observations
                    .iter()
                    .map(|obs| obs.categorical_fields()[idx].1)
                    .collect();
                CategoricalFeature {
                    name: (*name).to_string(),
                    categories: categories.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();

        Self { features }
    }

    /// Total number of indicator columns.
    pub fn width(&self) -> usize {
        self.features.iter().map(|f| f.categories.len()).sum()
    }

    /// Indicator column names in encoding order.
    pub fn column_names(&self) -> Vec<String> {
        self.features
            .iter()
            .flat_map(|f| f.categories.iter().map(move |c| f.column_name(c)))
            .collect()
    }

    /// Encode the categorical fields of one observation.
    ///
    /// Unseen categories leave their feature's indicators at zero.
    pub fn encode(&self, observation: &Observation) -> Vec<f64> {
        let values = observation.categorical_fields();
        let mut indicators = vec![0.0; self.width()];
        let mut offset = 0;

        for feature in &self.features {
            let value = values
                .iter()
                .find(|(name, _)| *name == feature.name)
                .map(|(_, v)| *v);
            if let Some(pos) = value.and_then(|v| feature.position(v)) {
                indicators[offset + pos] = 1.0;
            }
            offset += feature.categories.len();
        }

        indicators
    }

    /// Recover the category of `feature` from a full indicator row.
    ///
    /// Returns `None` for an all-zero (unseen) encoding or an unknown feature.
    pub fn decode<'a>(&'a self, feature: &str, indicators: &[f64]) -> Option<&'a str> {
        let mut offset = 0;
        for f in &self.features {
            if f.name == feature {
                let slice = indicators.get(offset..offset + f.categories.len())?;
                return slice
                    .iter()
                    .position(|&v| v == 1.0)
                    .map(|pos| f.categories[pos].as_str());
            }
            offset += f.categories.len();
        }
        None
    }
}
