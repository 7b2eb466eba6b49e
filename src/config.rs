//! Configuration for the groundwater telemetry pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of readings kept in the rolling history
    pub history_capacity: usize,

    /// Interval between simulated dashboard ticks
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// IANA timezone used for displayed tick times
    pub timezone: String,

    /// Feature engineering windows
    pub features: FeatureConfig,

    /// Composite index constants
    pub scoring: ScoringConfig,

    /// Mock data generation
    pub simulation: SimulationConfig,

    /// Path for exporting tick snapshots
    pub export_path: PathBuf,

    /// Path for run logs and engineered artifacts
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("groundwater-telemetry");

        Self {
            history_capacity: 20,
            tick_interval: Duration::from_secs(1),
            timezone: "Asia/Kolkata".to_string(),
            features: FeatureConfig::default(),
            scoring: ScoringConfig::default(),
            simulation: SimulationConfig::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("groundwater-telemetry")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Where the persisted run counters live.
    pub fn run_log_path(&self) -> PathBuf {
        self.data_path.join("run_stats.json")
    }

    /// Resolve the configured display timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::invalid("timezone", format!("unknown zone '{}'", self.timezone)))
    }

    /// Check every section, failing on the first invalid constant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::invalid("history_capacity", "must be at least 1"));
        }
        self.tz()?;
        self.features.validate()?;
        self.scoring.validate()?;
        self.simulation.validate()
    }
}

/// Window sizes for the offline feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Lag (in rows) for `prev_level`
    pub lag: usize,
    /// Short rainfall window (rows, inclusive of the current row)
    pub short_window: usize,
    /// Long rainfall / PET window (rows, inclusive of the current row)
    pub long_window: usize,
    /// Rows ahead used for the recharge target
    pub horizon: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lag: 1,
            short_window: 7,
            long_window: 30,
            horizon: 30,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lag == 0 {
            return Err(ConfigError::invalid("features.lag", "must be at least 1"));
        }
        if self.short_window == 0 || self.long_window == 0 {
            return Err(ConfigError::invalid("features.window", "windows must be at least 1 row"));
        }
        if self.horizon == 0 {
            return Err(ConfigError::invalid("features.horizon", "must be at least 1"));
        }
        Ok(())
    }

    /// Leading rows that cannot carry every derived field.
    pub fn warm_up_rows(&self) -> usize {
        (self.short_window.max(self.long_window) - 1).max(self.lag)
    }
}

/// Closed numeric interval a jitter term is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterRange {
    pub low: f64,
    pub high: f64,
}

impl JitterRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(ConfigError::invalid(
                field,
                format!("invalid range [{}, {}]", self.low, self.high),
            ));
        }
        Ok(())
    }
}

/// A latitude/longitude region contributing a base population-density factor.
///
/// Bounds are strict and optional; a missing bound does not constrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityRegion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_above: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon_below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon_above: Option<f64>,
    pub base: f64,
}

impl DensityRegion {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_below.map_or(true, |b| lat < b)
            && self.lat_above.map_or(true, |b| lat > b)
            && self.lon_below.map_or(true, |b| lon < b)
            && self.lon_above.map_or(true, |b| lon > b)
    }
}

/// Regional lookup for the density term of P-Conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityTable {
    /// Base factor outside every listed region
    pub default_base: f64,
    /// Jitter added on top of the base factor
    pub jitter: JitterRange,
    /// Regions checked in order; the first match wins
    pub regions: Vec<DensityRegion>,
}

impl Default for DensityTable {
    fn default() -> Self {
        Self {
            default_base: 0.05,
            jitter: JitterRange::new(0.0, 0.1),
            regions: vec![DensityRegion {
                name: "south-east".to_string(),
                lat_below: Some(20.0),
                lat_above: None,
                lon_below: None,
                lon_above: Some(78.0),
                base: 0.3,
            }],
        }
    }
}

impl DensityTable {
    /// Base factor for a station location.
    pub fn base_for(&self, lat: f64, lon: f64) -> f64 {
        self.regions
            .iter()
            .find(|r| r.contains(lat, lon))
            .map(|r| r.base)
            .unwrap_or(self.default_base)
    }
}

/// Constants of the composite indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Reference level MTDI measures deviation from (m)
    pub baseline_level: f64,
    /// MTDI scale per meter of deviation
    pub scale: f64,
    /// Jitter term added to MTDI
    pub mtdi_jitter: JitterRange,
    /// Level at which the resilience buffer is exhausted (m)
    pub max_level: f64,
    /// Meters of headroom per HCRS point
    pub unit_drop: f64,
    /// P-Conflict weight on MTDI (w1)
    pub weight_disparity: f64,
    /// P-Conflict weight on inverse HCRS (w2)
    pub weight_resilience: f64,
    /// STI penalty per unit of anomaly score (penalty_a)
    pub penalty_anomaly: f64,
    /// STI penalty per unit of data-gap factor (penalty_b)
    pub penalty_gap: f64,
    /// Lowest physically plausible water level (m)
    pub plausible_min: f64,
    /// Highest physically plausible water level (m)
    pub plausible_max: f64,
    pub density: DensityTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline_level: 100.0,
            scale: 0.1,
            mtdi_jitter: JitterRange::new(0.05, 0.2),
            max_level: 105.0,
            unit_drop: 0.1,
            weight_disparity: 0.4,
            weight_resilience: 0.4,
            penalty_anomaly: 500.0,
            penalty_gap: 10.0,
            plausible_min: 0.0,
            plausible_max: 1000.0,
            density: DensityTable::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("scoring.baseline_level", self.baseline_level),
            ("scoring.max_level", self.max_level),
            ("scoring.plausible_min", self.plausible_min),
            ("scoring.plausible_max", self.plausible_max),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }

        let non_negative = [
            ("scoring.weight_disparity", self.weight_disparity),
            ("scoring.weight_resilience", self.weight_resilience),
            ("scoring.penalty_anomaly", self.penalty_anomaly),
            ("scoring.penalty_gap", self.penalty_gap),
            ("scoring.density.default_base", self.density.default_base),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
            }
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::invalid("scoring.scale", "must be > 0"));
        }
        if !self.unit_drop.is_finite() || self.unit_drop <= 0.0 {
            return Err(ConfigError::invalid("scoring.unit_drop", "must be > 0"));
        }
        if self.plausible_min >= self.plausible_max {
            return Err(ConfigError::invalid(
                "scoring.plausible_min",
                "must be below plausible_max",
            ));
        }
        if self.max_level <= self.plausible_min {
            return Err(ConfigError::invalid(
                "scoring.max_level",
                "must be above plausible_min",
            ));
        }

        self.mtdi_jitter.validate("scoring.mtdi_jitter")?;
        self.density.jitter.validate("scoring.density.jitter")?;

        for region in &self.density.regions {
            if !region.base.is_finite() || region.base < 0.0 {
                return Err(ConfigError::invalid(
                    "scoring.density.regions",
                    format!("region '{}' has negative base", region.name),
                ));
            }
        }

        Ok(())
    }
}

/// Parameters of the mock sensor network and reading generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for reproducible runs (random when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Lower clamp for simulated levels (m)
    pub level_min: f64,
    /// Upper clamp for simulated levels (m)
    pub level_max: f64,
    /// Level rise per millimeter of what-if rainfall (m/mm)
    pub rainfall_response: f64,
    /// Levels below this are flagged as anomalous (m)
    pub anomaly_level: f64,
    /// Mock stations shared by the landlocked regions
    pub landlocked_stations: usize,
    /// Mock stations shared by the border and coastal regions
    pub coastal_stations: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            level_min: 95.0,
            level_max: 105.0,
            rainfall_response: 0.05,
            anomaly_level: 97.0,
            landlocked_stations: 100,
            coastal_stations: 20,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.level_min.is_finite() || !self.level_max.is_finite() || self.level_min >= self.level_max
        {
            return Err(ConfigError::invalid(
                "simulation.level_min",
                "must be below level_max",
            ));
        }
        if !self.rainfall_response.is_finite() || self.rainfall_response < 0.0 {
            return Err(ConfigError::invalid(
                "simulation.rainfall_response",
                "must be >= 0",
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid configuration '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
