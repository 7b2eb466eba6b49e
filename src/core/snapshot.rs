//! Per-tick snapshot records for export.
//!
//! A snapshot captures one scored reading: the inputs, the four indices with
//! their tiers and status text, and enough producer metadata to trace it back
//! to a run.

use crate::core::indices::{CompositeIndices, IndexKind, Tier};
use crate::core::observation::{Observation, SensorSignals};
use crate::core::window::{RollingWindow, WindowSummary};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "groundwater-telemetry";

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// One index value with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReading {
    pub index: IndexKind,
    pub value: f64,
    pub tier: Tier,
    /// Status line for the tier (e.g. "Data Trusted")
    pub status: String,
}

/// Reading values shown alongside the indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSummary {
    pub water_level: f64,
    pub rainfall_mm: f64,
    pub pet_mm: f64,
    pub avg_temp_c: f64,
    pub elevation: f64,
    pub lat: f64,
    pub lon: f64,
    /// Next-day forecast, when the tick produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_level: Option<f64>,
}

/// Simulated station outlook carried alongside the indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationOutlook {
    /// Level below the anomaly trigger or station flagged as anomalous
    pub is_anomaly: bool,
    /// Probability of a critical drop
    pub drought_risk: f64,
    /// Estimated net recharge over the next 30 days (m)
    pub recharge_30d: f64,
    pub extraction_rate: f64,
}

/// Scored reading for one station at one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Snapshot schema version
    pub snapshot_version: String,
    pub snapshot_id: String,
    pub station_id: String,
    /// When the reading was taken (RFC3339)
    pub observed_at_utc: String,
    /// When this payload was computed (RFC3339)
    pub computed_at_utc: String,
    /// Observation time in the configured display timezone
    pub observed_at_local: String,
    pub producer: SnapshotProducer,
    pub reading: ReadingSummary,
    pub signals: SensorSignals,
    pub indices: CompositeIndices,
    pub index_readings: Vec<IndexReading>,
    /// True when any index is in the critical tier
    pub alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<StationOutlook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

impl TickSnapshot {
    pub fn with_outlook(mut self, outlook: StationOutlook) -> Self {
        self.outlook = Some(outlook);
        self
    }
}

/// Builder for tick snapshots.
pub struct SnapshotBuilder {
    instance_id: Uuid,
    timezone: Tz,
    session_id: Option<String>,
}

impl SnapshotBuilder {
    /// Create a builder with a unique instance ID.
    pub fn new(timezone: Tz) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            timezone,
            session_id: None,
        }
    }

    /// Set the session ID for generated snapshots.
    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a snapshot from a scored reading.
    pub fn build(
        &self,
        station_id: &str,
        current: &Observation,
        signals: SensorSignals,
        indices: &CompositeIndices,
        window: &RollingWindow,
    ) -> TickSnapshot {
        let computed_at = Utc::now();

        let index_readings = IndexKind::ALL
            .iter()
            .map(|&kind| {
                let tier = indices.tier(kind);
                IndexReading {
                    index: kind,
                    value: indices.value(kind),
                    tier,
                    status: kind.status_text(tier).to_string(),
                }
            })
            .collect();

        let predicted_level = window
            .latest()
            .filter(|r| r.timestamp == current.timestamp)
            .and_then(|r| r.predicted_level);

        let meta = self.session_id.as_ref().map(|session| {
            let mut meta = HashMap::new();
            meta.insert(
                "session_id".to_string(),
                serde_json::Value::String(session.clone()),
            );
            meta
        });

        TickSnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            snapshot_id: Uuid::new_v4().to_string(),
            station_id: station_id.to_string(),
            observed_at_utc: current.timestamp.to_rfc3339(),
            computed_at_utc: computed_at.to_rfc3339(),
            observed_at_local: current
                .timestamp
                .with_timezone(&self.timezone)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string(),
            producer: SnapshotProducer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: Some(self.instance_id.to_string()),
            },
            reading: ReadingSummary {
                water_level: current.water_level,
                rainfall_mm: current.rainfall_mm,
                pet_mm: current.pet_mm,
                avg_temp_c: current.avg_temp_c,
                elevation: current.elevation,
                lat: current.lat,
                lon: current.lon,
                predicted_level,
            },
            signals,
            indices: indices.clone(),
            index_readings,
            alert: indices.is_alert(),
            outlook: None,
            window: window.summary(),
            meta,
        }
    }

    /// Build and serialize a snapshot to JSON.
    pub fn build_json(
        &self,
        station_id: &str,
        current: &Observation,
        signals: SensorSignals,
        indices: &CompositeIndices,
        window: &RollingWindow,
    ) -> String {
        let snapshot = self.build(station_id, current, signals, indices, window);
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}
