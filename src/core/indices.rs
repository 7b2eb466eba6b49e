//! Composite risk and trust indices computed once per tick.
//!
//! Four bounded scores drive alerting on the dashboard:
//!
//! | Index | Formula | Range | Worse when |
//! |---|---|---|---|
//! | MTDI | `abs(level - baseline) * scale + jitter` | unbounded | higher |
//! | HCRS | `(max_level - level) / unit_drop` | 0-100 | lower |
//! | P-Conflict | `MTDI * w1 + (100 - HCRS) / 100 * w2 + density` | 0-1 | higher |
//! | STI | `100 - anomaly * penalty_a - gap * penalty_b` | 0-100 | lower |
//!
//! Each index is recomputed from the current reading alone. The rolling
//! window only contributes the informational `level_trend`.

use crate::config::{ConfigError, ScoringConfig};
use crate::core::error::DataError;
use crate::core::noise::NoiseSource;
use crate::core::observation::{Observation, SensorSignals};
use crate::core::window::RollingWindow;
use serde::{Deserialize, Serialize};

/// Which composite index a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Mtdi,
    Hcrs,
    PConflict,
    Sti,
}

/// Alert tier of an index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    Watch,
    Critical,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Mtdi,
        IndexKind::Hcrs,
        IndexKind::PConflict,
        IndexKind::Sti,
    ];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            IndexKind::Mtdi => "MTDI",
            IndexKind::Hcrs => "HCRS",
            IndexKind::PConflict => "P-Conflict",
            IndexKind::Sti => "STI",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IndexKind::Mtdi => "Trend Disparity Index",
            IndexKind::Hcrs => "Resilience Score",
            IndexKind::PConflict => "Predicted Conflict Risk",
            IndexKind::Sti => "Sensor Trust Index",
        }
    }

    /// Classify a value of this index.
    pub fn classify(self, value: f64) -> Tier {
        match self {
            IndexKind::Mtdi => {
                if value > 0.5 {
                    Tier::Critical
                } else if value > 0.3 {
                    Tier::Watch
                } else {
                    Tier::Normal
                }
            }
            IndexKind::Hcrs => {
                if value < 50.0 {
                    Tier::Critical
                } else if value < 75.0 {
                    Tier::Watch
                } else {
                    Tier::Normal
                }
            }
            IndexKind::PConflict => {
                if value > 0.6 {
                    Tier::Critical
                } else if value > 0.3 {
                    Tier::Watch
                } else {
                    Tier::Normal
                }
            }
            IndexKind::Sti => {
                if value < 80.0 {
                    Tier::Critical
                } else if value < 90.0 {
                    Tier::Watch
                } else {
                    Tier::Normal
                }
            }
        }
    }

    /// Status line shown next to the index for a tier.
    pub fn status_text(self, tier: Tier) -> &'static str {
        match (self, tier) {
            (IndexKind::Mtdi, Tier::Critical) => "Critical Disparity",
            (IndexKind::Mtdi, Tier::Watch) => "Watch Trend",
            (IndexKind::Mtdi, Tier::Normal) => "Stable Trend",
            (IndexKind::Hcrs, Tier::Critical) => "High Risk",
            (IndexKind::Hcrs, Tier::Watch) => "Moderate Risk",
            (IndexKind::Hcrs, Tier::Normal) => "Low Risk",
            (IndexKind::PConflict, Tier::Critical) => "High Conflict Risk",
            (IndexKind::PConflict, Tier::Watch) => "Moderate Tension",
            (IndexKind::PConflict, Tier::Normal) => "Low Tension",
            (IndexKind::Sti, Tier::Critical) => "Integrity Compromised",
            (IndexKind::Sti, Tier::Watch) => "Review Data Source",
            (IndexKind::Sti, Tier::Normal) => "Data Trusted",
        }
    }
}

/// The four indices for one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndices {
    /// Trend Disparity Index (higher is worse)
    pub mtdi: f64,
    /// Resilience Score, 0-100 (lower is worse)
    pub hcrs: f64,
    /// Predicted conflict risk, 0-1 (higher is worse)
    pub p_conflict: f64,
    /// Sensor Trust Index, 0-100 (lower is worse)
    pub sti: f64,
    /// Density term that went into P-Conflict
    pub density_factor: f64,
    /// Mean per-tick level change over the rolling window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_trend: Option<f64>,
}

impl CompositeIndices {
    pub fn value(&self, kind: IndexKind) -> f64 {
        match kind {
            IndexKind::Mtdi => self.mtdi,
            IndexKind::Hcrs => self.hcrs,
            IndexKind::PConflict => self.p_conflict,
            IndexKind::Sti => self.sti,
        }
    }

    pub fn tier(&self, kind: IndexKind) -> Tier {
        kind.classify(self.value(kind))
    }

    /// Worst tier across all four indices.
    pub fn worst_tier(&self) -> Tier {
        IndexKind::ALL
            .iter()
            .map(|&k| self.tier(k))
            .max()
            .unwrap_or(Tier::Normal)
    }

    pub fn is_alert(&self) -> bool {
        self.worst_tier() == Tier::Critical
    }
}

/// Computes [`CompositeIndices`] from a reading and the configured constants.
///
/// Holds only immutable configuration, so one calculator can score many
/// stations concurrently.
#[derive(Debug, Clone)]
pub struct IndexCalculator {
    config: ScoringConfig,
}

impl IndexCalculator {
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one reading.
    pub fn compute(
        &self,
        current: &Observation,
        signals: SensorSignals,
        window: &RollingWindow,
        noise: &mut dyn NoiseSource,
    ) -> Result<CompositeIndices, DataError> {
        self.validate(current, signals)?;

        let mtdi = self.mtdi(current.water_level, noise.jitter(self.config.mtdi_jitter));
        let hcrs = self.hcrs(current.water_level);
        let density_factor = self.density_factor(
            current.lat,
            current.lon,
            noise.jitter(self.config.density.jitter),
        );
        let p_conflict = self.p_conflict(mtdi, hcrs, density_factor);
        let sti = self.sti(signals);

        tracing::debug!(
            water_level = current.water_level,
            mtdi,
            hcrs,
            p_conflict,
            sti,
            "indices computed"
        );

        Ok(CompositeIndices {
            mtdi,
            hcrs,
            p_conflict,
            sti,
            density_factor,
            level_trend: window.trend(),
        })
    }

    /// Trend Disparity Index for a level and a jitter draw.
    pub fn mtdi(&self, water_level: f64, jitter: f64) -> f64 {
        let raw = (water_level - self.config.baseline_level).abs() * self.config.scale + jitter;
        round_to(raw, 4)
    }

    /// Resilience Score, clamped to 0-100.
    pub fn hcrs(&self, water_level: f64) -> f64 {
        let raw = (self.config.max_level - water_level) / self.config.unit_drop;
        raw.round().clamp(0.0, 100.0)
    }

    /// Regional base factor plus a jitter draw.
    pub fn density_factor(&self, lat: f64, lon: f64, jitter: f64) -> f64 {
        self.config.density.base_for(lat, lon) + jitter
    }

    /// Predicted conflict risk, clamped to 0-1.
    pub fn p_conflict(&self, mtdi: f64, hcrs: f64, density_factor: f64) -> f64 {
        let raw = mtdi * self.config.weight_disparity
            + (100.0 - hcrs) / 100.0 * self.config.weight_resilience
            + density_factor;
        // Opposing infinite terms give NaN, which clamp passes through.
        if raw.is_nan() {
            return 1.0;
        }
        round_to(raw, 4).clamp(0.0, 1.0)
    }

    /// Sensor Trust Index, clamped to 0-100.
    pub fn sti(&self, signals: SensorSignals) -> f64 {
        let raw = 100.0
            - signals.anomaly_score * self.config.penalty_anomaly
            - signals.data_gap_factor * self.config.penalty_gap;
        if raw.is_nan() {
            return 0.0;
        }
        raw.round().clamp(0.0, 100.0)
    }

    fn validate(&self, current: &Observation, signals: SensorSignals) -> Result<(), DataError> {
        let level = current.water_level;
        if !level.is_finite() || level < self.config.plausible_min || level > self.config.plausible_max
        {
            return Err(DataError::WaterLevelOutOfRange {
                value: level,
                min: self.config.plausible_min,
                max: self.config.plausible_max,
            });
        }

        let inputs = [
            ("anomaly_score", signals.anomaly_score),
            ("data_gap_factor", signals.data_gap_factor),
            ("lat", current.lat),
            ("lon", current.lon),
        ];
        if let Some(&(field, value)) = inputs.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::InvalidSignal { field, value });
        }

        Ok(())
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
