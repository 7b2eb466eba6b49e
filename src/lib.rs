//! Groundwater Telemetry - feature engineering and composite risk scoring
//! for groundwater-level monitoring stations.
//!
//! The crate has two independent halves that share only the [`Observation`]
//! record:
//!
//! - **Offline**: [`FeatureEngineer`] turns a daily series into a model-ready
//!   table (lag, rolling sums, forward-difference target, one-hot indicators)
//!   and fits an [`EncodingVocabulary`] that later transforms must reuse.
//! - **Live**: [`DashboardState`] owns a bounded [`RollingWindow`] and calls
//!   [`IndexCalculator`] once per tick to produce MTDI, HCRS, P-Conflict and
//!   STI.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Groundwater Telemetry                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Dataset    │──▶│  Feature    │──▶│  Dataset    │         │
//! │  │  (CSV in)   │   │  Engineer   │   │ (CSV, JSON) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                                                              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Tick Feed  │──▶│  Dashboard  │──▶│   Tick      │         │
//! │  │ + Simulator │   │  (window +  │   │  Snapshot   │         │
//! │  └─────────────┘   │  indices)   │   └─────────────┘         │
//! │                    └─────────────┘          │                │
//! │                           │                 ▼                │
//! │                           └──────────▶ ┌─────────────┐       │
//! │                                        │   Run Log   │       │
//! │                                        └─────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use groundwater_telemetry::{generate_series, FeatureEngineer, SeededNoise};
//! use groundwater_telemetry::config::FeatureConfig;
//!
//! let series = generate_series(365, &mut SeededNoise::seeded(42));
//! let engineer = FeatureEngineer::new(FeatureConfig::default()).expect("valid config");
//! let (table, vocabulary) = engineer.fit_transform(series).expect("clean series");
//! println!("{} rows, {} indicator columns", table.len(), vocabulary.width());
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod dataset;
pub mod simulator;

// Re-export key types at crate root for convenience
pub use audit::{RunLog, RunStats, SharedRunLog};
pub use config::{Config, ConfigError, FeatureConfig, ScoringConfig, SimulationConfig};
pub use core::{
    CompositeIndices, DataError, EncodingVocabulary, EngineeredRow, EngineeredTable,
    FeatureEngineer, FixedNoise, IndexCalculator, IndexKind, NoiseSource, Observation,
    RollingWindow, SensorSignals, SnapshotBuilder, Tier, TickSnapshot,
};
pub use dashboard::DashboardState;
pub use dataset::{DatasetError, ExportFormat};
pub use simulator::{generate_series, ReadingSimulator, SeededNoise, StationRegistry, TickFeed};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference card for reading the composite indices.
pub const INDEX_LEGEND: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              GROUNDWATER TELEMETRY - INDEX LEGEND                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  MTDI  Trend Disparity Index (higher is worse)                   ║
║    > 0.5 Critical Disparity   0.3-0.5 Watch Trend                ║
║    < 0.3 Stable Trend                                            ║
║                                                                  ║
║  HCRS  Resilience Score, 0-100 (lower is worse)                  ║
║    < 50 High Risk   50-75 Moderate Risk   > 75 Low Risk          ║
║                                                                  ║
║  P-Conflict  Predicted conflict risk, 0-1 (higher is worse)      ║
║    > 0.6 High Conflict Risk   0.3-0.6 Moderate Tension           ║
║    < 0.3 Low Tension                                             ║
║                                                                  ║
║  STI  Sensor Trust Index, 0-100 (lower is worse)                 ║
║    < 80 Integrity Compromised   80-90 Review Data Source         ║
║    > 90 Data Trusted                                             ║
║                                                                  ║
║  A tick raises an alert when any index is in its worst tier.     ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_legend_contents() {
        for kind in IndexKind::ALL {
            for tier in [Tier::Normal, Tier::Watch, Tier::Critical] {
                assert!(
                    INDEX_LEGEND.contains(kind.status_text(tier)),
                    "legend missing {:?}/{:?}",
                    kind,
                    tier
                );
            }
        }
    }
}
