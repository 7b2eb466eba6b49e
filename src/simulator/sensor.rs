//! Live reading simulation for a single station.

use crate::config::SimulationConfig;
use crate::core::indices::round_to;
use crate::core::noise::NoiseSource;
use crate::core::observation::{Observation, SensorSignals};
use crate::core::snapshot::StationOutlook;
use crate::simulator::stations::{Station, StationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum drift between consecutive ticks (m).
const LEVEL_DRIFT: f64 = 0.1;
/// Range of the simulated next-day change (m).
const DAILY_CHANGE: (f64, f64) = (-0.5, 0.75);
const NORMAL_ANOMALY: (f64, f64) = (0.01, 0.1);
const ELEVATED_ANOMALY: (f64, f64) = (0.5, 0.9);
const DATA_GAP: (f64, f64) = (0.0, 0.1);

/// One simulated tick for a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveReading {
    pub station_id: String,
    pub observation: Observation,
    pub signals: SensorSignals,
    /// Forecast level for the next day (m)
    pub predicted_level: f64,
    pub outlook: StationOutlook,
}

/// Produces the next reading from the previous level.
///
/// The simulator holds no per-station state. The caller passes the last
/// level it observed, or the station's starting level on the first tick.
#[derive(Debug, Clone)]
pub struct ReadingSimulator {
    config: SimulationConfig,
}

impl ReadingSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn clamp_level(&self, level: f64) -> f64 {
        level.clamp(self.config.level_min, self.config.level_max)
    }

    /// Simulate one tick.
    ///
    /// `rainfall_mm` is the what-if rainfall entered by the operator; it is
    /// added to the simulated daily rainfall and lifts the forecast level.
    pub fn next_reading(
        &self,
        station: &Station,
        last_level: f64,
        rainfall_mm: f64,
        at: DateTime<Utc>,
        noise: &mut dyn NoiseSource,
    ) -> LiveReading {
        let rainfall_override = if rainfall_mm.is_finite() {
            rainfall_mm.max(0.0)
        } else {
            0.0
        };

        let water_level =
            self.clamp_level(round_to(last_level + noise.uniform(-LEVEL_DRIFT, LEVEL_DRIFT), 2));

        let rainfall_lift = rainfall_override * self.config.rainfall_response;
        let change = noise.uniform(DAILY_CHANGE.0, DAILY_CHANGE.1);
        let predicted_level = self.clamp_level(round_to(water_level + change + rainfall_lift, 2));

        let rainfall = round_to(noise.uniform(0.0, 5.0) + rainfall_override, 2);
        let avg_temp_c = round_to(noise.uniform(20.0, 35.0), 1);
        let pet_mm = round_to(noise.uniform(3.0, 7.0), 2);

        let is_anomaly =
            water_level < self.config.anomaly_level || station.status == StationStatus::Anomaly;
        let (anomaly_range, risk_range) = if is_anomaly {
            (ELEVATED_ANOMALY, (0.75, 0.95))
        } else {
            (NORMAL_ANOMALY, (0.1, 0.75))
        };
        let anomaly_score = round_to(noise.uniform(anomaly_range.0, anomaly_range.1), 4);
        let drought_risk = noise.uniform(risk_range.0, risk_range.1);
        let data_gap_factor = noise.uniform(DATA_GAP.0, DATA_GAP.1);
        let elevation = 150.0 + noise.uniform(-10.0, 10.0).round();

        LiveReading {
            station_id: station.id.clone(),
            observation: Observation {
                timestamp: at,
                water_level,
                rainfall_mm: rainfall,
                pet_mm,
                avg_temp_c,
                lat: station.lat,
                lon: station.lon,
                elevation,
                soil_type: String::new(),
                land_use: String::new(),
            },
            signals: SensorSignals::new(anomaly_score, data_gap_factor),
            predicted_level,
            outlook: StationOutlook {
                is_anomaly,
                drought_risk: round_to(drought_risk, 4),
                recharge_30d: round_to(noise.uniform(-3.0, 3.0), 2),
                extraction_rate: round_to(noise.uniform(5.0, 15.0), 2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::noise::FixedNoise;
    use crate::simulator::noise::SeededNoise;
    use crate::simulator::stations::StationType;

    fn station(status: StationStatus) -> Station {
        Station {
            id: "CHENNAI__CITY_1".to_string(),
            name: "CHENNAI -CITY".to_string(),
            state: "Tamil Nadu".to_string(),
            district: "CHENNAI".to_string(),
            tahsil: "CHENNAI".to_string(),
            lat: 13.0827,
            lon: 80.2707,
            station_type: StationType::Ground,
            status,
            initial_level: 100.0,
        }
    }

    #[test]
    fn test_midpoint_reading() {
        let sim = ReadingSimulator::new(SimulationConfig::default());
        let reading = sim.next_reading(
            &station(StationStatus::Normal),
            100.0,
            0.0,
            Utc::now(),
            &mut FixedNoise::midpoint(),
        );

        assert_eq!(reading.observation.water_level, 100.0);
        assert_eq!(reading.predicted_level, 100.13);
        assert_eq!(reading.observation.rainfall_mm, 2.5);
        assert_eq!(reading.observation.elevation, 150.0);
        assert_eq!(reading.observation.lat, 13.0827);
        assert!(!reading.outlook.is_anomaly);
        assert!((reading.signals.anomaly_score - 0.055).abs() < 1e-9);
        assert_eq!(reading.outlook.drought_risk, 0.425);
        assert_eq!(reading.outlook.recharge_30d, 0.0);
        assert_eq!(reading.outlook.extraction_rate, 10.0);
    }

    #[test]
    fn test_what_if_rainfall_lifts_forecast() {
        let sim = ReadingSimulator::new(SimulationConfig::default());
        let dry = sim.next_reading(&station(StationStatus::Normal), 100.0, 0.0, Utc::now(), &mut FixedNoise::low());
        let wet = sim.next_reading(&station(StationStatus::Normal), 100.0, 10.0, Utc::now(), &mut FixedNoise::low());

        assert!((wet.predicted_level - dry.predicted_level - 0.5).abs() < 1e-9);
        assert!((wet.observation.rainfall_mm - dry.observation.rainfall_mm - 10.0).abs() < 1e-9);

        let bad = sim.next_reading(&station(StationStatus::Normal), 100.0, f64::NAN, Utc::now(), &mut FixedNoise::low());
        assert_eq!(bad.predicted_level, dry.predicted_level);
    }

    #[test]
    fn test_levels_clamped() {
        let sim = ReadingSimulator::new(SimulationConfig::default());
        let high = sim.next_reading(&station(StationStatus::Normal), 104.99, 50.0, Utc::now(), &mut FixedNoise::high());
        assert_eq!(high.observation.water_level, 105.0);
        assert_eq!(high.predicted_level, 105.0);

        let low = sim.next_reading(&station(StationStatus::Normal), 95.0, 0.0, Utc::now(), &mut FixedNoise::low());
        assert_eq!(low.observation.water_level, 95.0);
        assert_eq!(low.predicted_level, 95.0);
    }

    #[test]
    fn test_anomaly_triggers() {
        let sim = ReadingSimulator::new(SimulationConfig::default());
        let low_level = sim.next_reading(&station(StationStatus::Normal), 96.0, 0.0, Utc::now(), &mut FixedNoise::low());
        assert!(low_level.outlook.is_anomaly);
        assert_eq!(low_level.signals.anomaly_score, 0.5);

        let flagged = sim.next_reading(&station(StationStatus::Anomaly), 100.0, 0.0, Utc::now(), &mut FixedNoise::low());
        assert!(flagged.outlook.is_anomaly);
        assert_eq!(flagged.outlook.drought_risk, 0.75);
    }

    #[test]
    fn test_seeded_readings_in_bounds() {
        let sim = ReadingSimulator::new(SimulationConfig::default());
        let st = station(StationStatus::Normal);
        let mut noise = SeededNoise::seeded(11);
        let mut level = st.initial_level;
        for _ in 0..200 {
            let reading = sim.next_reading(&st, level, 0.0, Utc::now(), &mut noise);
            assert!((95.0..=105.0).contains(&reading.observation.water_level));
            assert!((95.0..=105.0).contains(&reading.predicted_level));
            assert!((0.0..=0.1).contains(&reading.signals.data_gap_factor));
            level = reading.observation.water_level;
        }
    }
}
