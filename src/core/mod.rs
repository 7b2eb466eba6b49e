//! Core computation for groundwater telemetry.
//!
//! This module contains:
//! - Observation records and the error taxonomy for bad input
//! - Offline feature engineering with categorical encoding
//! - The rolling reading window and composite index scoring
//! - Tick snapshot building for export

pub mod encoding;
pub mod error;
pub mod features;
pub mod indices;
pub mod noise;
pub mod observation;
pub mod snapshot;
pub mod window;

// Re-export commonly used types
pub use encoding::{CategoricalFeature, EncodingVocabulary, CATEGORICAL_COLUMNS};
pub use error::DataError;
pub use features::{EngineeredRow, EngineeredTable, FeatureEngineer, DERIVED_COLUMNS};
pub use indices::{CompositeIndices, IndexCalculator, IndexKind, Tier};
pub use noise::{FixedNoise, NoiseSource};
pub use observation::{Observation, SensorSignals};
pub use snapshot::{
    SnapshotBuilder, StationOutlook, TickSnapshot, PRODUCER_NAME, SNAPSHOT_VERSION,
};
pub use window::{RollingWindow, WindowSummary, WindowedReading};
