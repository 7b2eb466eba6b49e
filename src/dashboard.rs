//! Live dashboard state for one selected station.
//!
//! `DashboardState` is the single owner of the rolling history. Each tick it
//! simulates (or accepts) a reading, scores it against the history, appends it
//! and emits a snapshot. The calculator only ever borrows the window.

use crate::audit::SharedRunLog;
use crate::config::{Config, ConfigError};
use crate::core::error::DataError;
use crate::core::indices::IndexCalculator;
use crate::core::noise::NoiseSource;
use crate::core::snapshot::{SnapshotBuilder, TickSnapshot};
use crate::core::window::{RollingWindow, WindowedReading};
use crate::simulator::feed::Tick;
use crate::simulator::sensor::{LiveReading, ReadingSimulator};
use crate::simulator::stations::Station;

pub struct DashboardState {
    station: Station,
    window: RollingWindow,
    calculator: IndexCalculator,
    simulator: ReadingSimulator,
    snapshots: SnapshotBuilder,
    last_level: f64,
    rainfall_mm: f64,
    run_log: Option<SharedRunLog>,
}

impl DashboardState {
    /// Build dashboard state for `station`, validating the configuration.
    pub fn new(config: &Config, station: Station) -> Result<Self, ConfigError> {
        config.validate()?;
        let last_level = station.initial_level;
        Ok(Self {
            station,
            window: RollingWindow::new(config.history_capacity),
            calculator: IndexCalculator::new(config.scoring.clone())?,
            simulator: ReadingSimulator::new(config.simulation.clone()),
            snapshots: SnapshotBuilder::new(config.tz()?),
            last_level,
            rainfall_mm: 0.0,
            run_log: None,
        })
    }

    /// Count scored and rejected ticks in a shared run log.
    pub fn with_run_log(mut self, run_log: SharedRunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.snapshots = self.snapshots.with_session_id(session_id);
        self
    }

    /// Set the what-if rainfall (mm) applied to subsequent ticks.
    pub fn set_rainfall(&mut self, rainfall_mm: f64) {
        self.rainfall_mm = rainfall_mm;
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Last accepted level, or the station's starting level.
    pub fn last_level(&self) -> f64 {
        self.last_level
    }

    /// Simulate the next reading and score it.
    pub fn on_tick(
        &mut self,
        tick: &Tick,
        noise: &mut dyn NoiseSource,
    ) -> Result<TickSnapshot, DataError> {
        let reading = self.simulator.next_reading(
            &self.station,
            self.last_level,
            self.rainfall_mm,
            tick.at,
            noise,
        );
        self.on_reading(&reading, noise)
    }

    /// Score a reading and append it to the history.
    ///
    /// A rejected reading leaves the window and last level untouched.
    pub fn on_reading(
        &mut self,
        reading: &LiveReading,
        noise: &mut dyn NoiseSource,
    ) -> Result<TickSnapshot, DataError> {
        let current = &reading.observation;
        let indices = match self
            .calculator
            .compute(current, reading.signals, &self.window, noise)
        {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!(station = %self.station.id, error = %e, "reading rejected");
                if let Some(log) = &self.run_log {
                    log.record_rejected();
                }
                return Err(e);
            }
        };

        self.window.push(
            WindowedReading::new(current.timestamp, current.water_level)
                .with_prediction(reading.predicted_level),
        );
        self.last_level = current.water_level;

        let snapshot = self.snapshots.build(
            &self.station.id,
            current,
            reading.signals,
            &indices,
            &self.window,
        )
        .with_outlook(reading.outlook);

        if let Some(log) = &self.run_log {
            log.record_tick(snapshot.alert);
        }
        if snapshot.alert {
            tracing::info!(
                station = %self.station.id,
                worst = ?indices.worst_tier(),
                "critical index on tick"
            );
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::create_shared_log;
    use crate::core::noise::FixedNoise;
    use crate::simulator::stations::{StationStatus, StationType};
    use chrono::Utc;

    fn station() -> Station {
        Station {
            id: "PUNE__WEST_2".to_string(),
            name: "PUNE -WEST".to_string(),
            state: "Maharashtra".to_string(),
            district: "PUNE".to_string(),
            tahsil: "PUNE".to_string(),
            lat: 18.5204,
            lon: 73.8567,
            station_type: StationType::Ground,
            status: StationStatus::Normal,
            initial_level: 100.0,
        }
    }

    fn tick(sequence: u64) -> Tick {
        Tick {
            sequence,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_window_bounded_by_capacity() {
        let config = Config {
            history_capacity: 5,
            ..Config::default()
        };
        let mut state = DashboardState::new(&config, station()).unwrap();
        let mut noise = FixedNoise::high();

        for i in 0..12 {
            state.on_tick(&tick(i), &mut noise).unwrap();
        }

        assert_eq!(state.window().len(), 5);
        assert!((state.last_level() - 101.2).abs() < 1e-9);
        let levels = state.window().levels();
        assert!((levels[0] - 100.8).abs() < 1e-9);
    }

    #[test]
    fn test_tick_drifts_from_last_level() {
        let mut state = DashboardState::new(&Config::default(), station()).unwrap();
        let mut noise = FixedNoise::low();

        let first = state.on_tick(&tick(0), &mut noise).unwrap();
        assert_eq!(first.reading.water_level, 99.9);
        let second = state.on_tick(&tick(1), &mut noise).unwrap();
        assert_eq!(second.reading.water_level, 99.8);
        assert_eq!(second.reading.predicted_level, Some(99.3));
        assert!(second.indices.level_trend.is_none());

        let third = state.on_tick(&tick(2), &mut noise).unwrap();
        assert!((third.indices.level_trend.unwrap() + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_reading_leaves_window() {
        let log = create_shared_log();
        let mut state = DashboardState::new(&Config::default(), station())
            .unwrap()
            .with_run_log(log.clone());
        let mut noise = FixedNoise::midpoint();

        let mut reading = ReadingSimulator::new(Config::default().simulation).next_reading(
            state.station(),
            100.0,
            0.0,
            Utc::now(),
            &mut noise,
        );
        state.on_reading(&reading, &mut noise).unwrap();

        reading.observation.water_level = -3.0;
        let err = state.on_reading(&reading, &mut noise).unwrap_err();
        assert!(matches!(err, DataError::WaterLevelOutOfRange { .. }));
        assert_eq!(state.window().len(), 1);
        assert_eq!(state.last_level(), 100.0);

        let stats = log.stats();
        assert_eq!(stats.ticks_scored, 1);
        assert_eq!(stats.readings_rejected, 1);
    }

    #[test]
    fn test_what_if_rainfall() {
        let mut state = DashboardState::new(&Config::default(), station()).unwrap();
        state.set_rainfall(10.0);
        let snapshot = state.on_tick(&tick(0), &mut FixedNoise::low()).unwrap();
        assert_eq!(snapshot.reading.rainfall_mm, 10.0);
        assert_eq!(snapshot.reading.predicted_level, Some(99.9));
        let outlook = snapshot.outlook.unwrap();
        assert_eq!(outlook.drought_risk, 0.1);
        assert_eq!(outlook.extraction_rate, 5.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.scoring.penalty_anomaly = -1.0;
        assert!(DashboardState::new(&config, station()).is_err());
    }
}
