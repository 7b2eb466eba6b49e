//! Persistent activity counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session, optionally seeded from disk.
#[derive(Debug)]
pub struct RunLog {
    /// Ticks scored by the dashboard loop
    ticks_scored: AtomicU64,
    /// Ticks where any index reached the critical tier
    alerts_raised: AtomicU64,
    /// Readings rejected with a data error
    readings_rejected: AtomicU64,
    /// Snapshots written to an export file
    snapshots_exported: AtomicU64,
    /// Rows written by the feature pipeline
    rows_engineered: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            ticks_scored: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            readings_rejected: AtomicU64::new(0),
            snapshots_exported: AtomicU64::new(0),
            rows_engineered: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that loads and saves its counters at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous run stats");
        }

        log
    }

    /// Record a scored tick and whether it raised an alert.
    pub fn record_tick(&self, alert: bool) {
        self.ticks_scored.fetch_add(1, Ordering::Relaxed);
        if alert {
            self.alerts_raised.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.readings_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshots_exported(&self, count: u64) {
        self.snapshots_exported.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_rows_engineered(&self, count: u64) {
        self.rows_engineered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            ticks_scored: self.ticks_scored.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            readings_rejected: self.readings_rejected.load(Ordering::Relaxed),
            snapshots_exported: self.snapshots_exported.load(Ordering::Relaxed),
            rows_engineered: self.rows_engineered.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Summary text for the `status` command.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let alert_rate = if stats.ticks_scored == 0 {
            0.0
        } else {
            stats.alerts_raised as f64 / stats.ticks_scored as f64 * 100.0
        };
        format!(
            "Run Statistics:\n\
             - Ticks scored: {}\n\
             - Alerts raised: {} ({:.1}%)\n\
             - Readings rejected: {}\n\
             - Snapshots exported: {}\n\
             - Rows engineered: {}\n\
             - Session duration: {} seconds",
            stats.ticks_scored,
            stats.alerts_raised,
            alert_rate,
            stats.readings_rejected,
            stats.snapshots_exported,
            stats.rows_engineered,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk. A log without a path is a no-op.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                ticks_scored: stats.ticks_scored,
                alerts_raised: stats.alerts_raised,
                readings_rejected: stats.readings_rejected,
                snapshots_exported: stats.snapshots_exported,
                rows_engineered: stats.rows_engineered,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.ticks_scored
                    .store(persisted.ticks_scored, Ordering::Relaxed);
                self.alerts_raised
                    .store(persisted.alerts_raised, Ordering::Relaxed);
                self.readings_rejected
                    .store(persisted.readings_rejected, Ordering::Relaxed);
                self.snapshots_exported
                    .store(persisted.snapshots_exported, Ordering::Relaxed);
                self.rows_engineered
                    .store(persisted.rows_engineered, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.ticks_scored.store(0, Ordering::Relaxed);
        self.alerts_raised.store(0, Ordering::Relaxed);
        self.readings_rejected.store(0, Ordering::Relaxed);
        self.snapshots_exported.store(0, Ordering::Relaxed);
        self.rows_engineered.store(0, Ordering::Relaxed);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub ticks_scored: u64,
    pub alerts_raised: u64,
    pub readings_rejected: u64,
    pub snapshots_exported: u64,
    pub rows_engineered: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    ticks_scored: u64,
    alerts_raised: u64,
    readings_rejected: u64,
    snapshots_exported: u64,
    #[serde(default)]
    rows_engineered: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared run log.
pub type SharedRunLog = Arc<RunLog>;

pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}
