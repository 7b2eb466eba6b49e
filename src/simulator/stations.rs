//! Mock monitoring-station network.
//!
//! Stations are scattered inside regional bounding boxes. Landlocked regions
//! carry most of the network; border and coastal regions get a thin spread.
//! Three real stations are always listed first.

use crate::config::SimulationConfig;
use crate::core::indices::round_to;
use crate::core::noise::NoiseSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A regional bounding box (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub landlocked: bool,
}

const fn region(
    name: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
    landlocked: bool,
) -> Region {
    Region {
        name,
        lat_min: lat.0,
        lat_max: lat.1,
        lon_min: lon.0,
        lon_max: lon.1,
        landlocked,
    }
}

/// Mainland regions, landlocked first.
pub const REGIONS: [Region; 34] = [
    region("Haryana", (27.5, 30.7), (74.5, 77.7), true),
    region("Madhya Pradesh", (21.0, 26.9), (74.0, 82.8), true),
    region("Chhattisgarh", (17.5, 23.5), (80.0, 84.0), true),
    region("Jharkhand", (22.0, 25.5), (83.5, 88.0), true),
    region("Telangana", (15.7, 19.5), (77.0, 81.8), true),
    region("Jammu and Kashmir (UT)", (32.5, 36.0), (73.5, 76.5), false),
    region("Ladakh (UT)", (32.0, 36.5), (75.0, 80.0), false),
    region("Himachal Pradesh", (30.0, 33.5), (75.5, 79.0), false),
    region("Punjab", (29.5, 32.5), (73.5, 77.5), false),
    region("Uttarakhand", (29.0, 31.5), (77.5, 81.0), false),
    region("Delhi (NCT)", (28.3, 28.8), (76.8, 77.3), false),
    region("Uttar Pradesh", (23.5, 31.0), (77.0, 84.8), false),
    region("Chandigarh (UT)", (30.7, 30.8), (76.7, 76.8), false),
    region("Rajasthan", (23.0, 30.0), (69.5, 78.5), false),
    region("Gujarat", (20.0, 24.5), (68.0, 74.5), false),
    region("Maharashtra", (15.5, 22.0), (72.5, 80.8), false),
    region("Goa", (14.9, 15.9), (73.7, 74.5), false),
    region("Daman, Diu, Dadra & Nagar Haveli (UT)", (20.0, 20.7), (72.8, 73.5), false),
    region("Bihar", (24.0, 27.5), (83.5, 88.5), false),
    region("West Bengal", (21.5, 27.5), (86.0, 89.5), false),
    region("Odisha", (17.5, 22.5), (81.5, 87.5), false),
    region("Andhra Pradesh", (12.5, 19.5), (77.0, 84.5), false),
    region("Karnataka", (11.5, 18.5), (74.0, 78.5), false),
    region("Kerala", (8.0, 12.8), (74.8, 77.5), false),
    region("Tamil Nadu", (8.0, 13.5), (76.5, 80.5), false),
    region("Puducherry (UT)", (11.8, 12.0), (79.8, 80.0), false),
    region("Sikkim", (27.0, 28.0), (88.0, 88.8), false),
    region("Arunachal Pradesh", (26.5, 29.5), (91.5, 97.0), false),
    region("Assam", (24.5, 27.8), (89.8, 96.0), false),
    region("Meghalaya", (25.0, 26.0), (90.0, 92.5), false),
    region("Nagaland", (25.0, 27.0), (93.5, 95.5), false),
    region("Manipur", (23.8, 25.7), (93.0, 95.0), false),
    region("Mizoram", (21.5, 24.5), (92.2, 93.5), false),
    region("Tripura", (22.5, 24.5), (91.0, 92.5), false),
];

/// Operating status of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    Normal,
    LowAlert,
    Anomaly,
}

/// Sampling pool, weighted towards `Normal`.
pub const STATUS_OPTIONS: [StationStatus; 6] = [
    StationStatus::Normal,
    StationStatus::Normal,
    StationStatus::Normal,
    StationStatus::Normal,
    StationStatus::LowAlert,
    StationStatus::Anomaly,
];

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StationStatus::Normal => "NORMAL",
            StationStatus::LowAlert => "LOW_ALERT",
            StationStatus::Anomaly => "ANOMALY",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationType {
    Ground,
    Surface,
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationType::Ground => write!(f, "GROUND"),
            StationType::Surface => write!(f, "SURFACE"),
        }
    }
}

/// A monitoring station and its starting level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub state: String,
    pub district: String,
    pub tahsil: String,
    pub lat: f64,
    pub lon: f64,
    pub station_type: StationType,
    pub status: StationStatus,
    /// Level the simulation starts from (m)
    pub initial_level: f64,
}

struct RealStation {
    name: &'static str,
    state: &'static str,
    district: &'static str,
    lat: f64,
    lon: f64,
    station_type: StationType,
}

const REAL_STATIONS: [RealStation; 3] = [
    RealStation {
        name: "KURNOOL -AWS",
        state: "Andhra Pradesh",
        district: "KURNOOL",
        lat: 15.75064,
        lon: 78.0668,
        station_type: StationType::Surface,
    },
    RealStation {
        name: "CHENNAI -CITY",
        state: "Tamil Nadu",
        district: "CHENNAI",
        lat: 13.0827,
        lon: 80.2707,
        station_type: StationType::Ground,
    },
    RealStation {
        name: "PUNE -WEST",
        state: "Maharashtra",
        district: "PUNE",
        lat: 18.5204,
        lon: 73.8567,
        station_type: StationType::Ground,
    },
];

/// Build a station id: spaces and hyphens become underscores, parentheses
/// are dropped, and the position is appended.
pub fn sanitize_id(name: &str, index: usize) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    format!("{}_{}", cleaned.to_uppercase(), index)
}

/// How many mock stations each region receives.
///
/// Landlocked regions split their target evenly; border and coastal regions
/// split theirs with the remainder handed out one each in table order.
pub fn allocation(landlocked_target: usize, coastal_target: usize) -> Vec<(&'static Region, usize)> {
    let landlocked: Vec<&Region> = REGIONS.iter().filter(|r| r.landlocked).collect();
    let coastal: Vec<&Region> = REGIONS.iter().filter(|r| !r.landlocked).collect();

    let mut plan = Vec::with_capacity(REGIONS.len());
    let per_landlocked = landlocked_target / landlocked.len();
    plan.extend(landlocked.into_iter().map(|r| (r, per_landlocked)));

    let base = coastal_target / coastal.len();
    let remainder = coastal_target % coastal.len();
    plan.extend(
        coastal
            .into_iter()
            .enumerate()
            .map(|(i, r)| (r, base + usize::from(i < remainder))),
    );
    plan
}

/// All stations known to a simulation run.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// Generate the network: real stations first, then mock ones per region.
    pub fn generate(config: &SimulationConfig, noise: &mut dyn NoiseSource) -> Self {
        let mut stations: Vec<Station> = REAL_STATIONS
            .iter()
            .map(|s| Station {
                id: String::new(),
                name: s.name.to_string(),
                state: s.state.to_string(),
                district: s.district.to_string(),
                tahsil: s.district.to_string(),
                lat: s.lat,
                lon: s.lon,
                station_type: s.station_type,
                status: StationStatus::Normal,
                initial_level: 0.0,
            })
            .collect();

        let mut counter = 0usize;
        for (region, count) in allocation(config.landlocked_stations, config.coastal_stations) {
            let prefix = region
                .name
                .split_whitespace()
                .next()
                .unwrap_or(region.name)
                .to_uppercase();
            for _ in 0..count {
                let lat = round_to(noise.uniform(region.lat_min, region.lat_max), 5);
                let lon = round_to(noise.uniform(region.lon_min, region.lon_max), 5);
                let station_type = if noise.index(2) == 0 {
                    StationType::Ground
                } else {
                    StationType::Surface
                };
                stations.push(Station {
                    id: String::new(),
                    name: format!("MOCK-{prefix}-{counter}"),
                    state: region.name.to_string(),
                    district: format!("Mock District {}", counter % 10),
                    tahsil: "Mock Tahsil".to_string(),
                    lat,
                    lon,
                    station_type,
                    status: StationStatus::Normal,
                    initial_level: 0.0,
                });
                counter += 1;
            }
        }

        for (i, station) in stations.iter_mut().enumerate() {
            station.id = sanitize_id(&station.name, i);
            station.status = if i < REAL_STATIONS.len() {
                STATUS_OPTIONS[i % STATUS_OPTIONS.len()]
            } else {
                STATUS_OPTIONS[noise.index(STATUS_OPTIONS.len())]
            };
            station.initial_level = round_to(100.0 + noise.uniform(-5.0, 5.0), 2);
        }

        tracing::debug!(count = stations.len(), "station registry generated");
        Self { stations }
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Look up a station, falling back to the first one when the id is unknown.
    pub fn get_or_first(&self, id: &str) -> Option<&Station> {
        self.get(id).or_else(|| self.stations.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::noise::FixedNoise;

    #[test]
    fn test_region_table() {
        assert_eq!(REGIONS.iter().filter(|r| r.landlocked).count(), 5);
        assert_eq!(REGIONS.iter().filter(|r| !r.landlocked).count(), 29);
        for r in REGIONS.iter() {
            assert!(r.lat_min < r.lat_max, "{}", r.name);
            assert!(r.lon_min < r.lon_max, "{}", r.name);
        }
    }

    #[test]
    fn test_allocation() {
        let plan = allocation(100, 20);
        assert_eq!(plan.iter().map(|(_, n)| n).sum::<usize>(), 120);
        assert!(plan.iter().filter(|(r, _)| r.landlocked).all(|(_, n)| *n == 20));

        let coastal: Vec<usize> = plan.iter().filter(|(r, _)| !r.landlocked).map(|(_, n)| *n).collect();
        assert!(coastal[..20].iter().all(|n| *n == 1));
        assert!(coastal[20..].iter().all(|n| *n == 0));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("KURNOOL -AWS", 0), "KURNOOL__AWS_0");
        assert_eq!(sanitize_id("MOCK-Delhi (NCT)-4", 9), "MOCK_DELHI_NCT_4_9");
    }

    #[test]
    fn test_generate_registry() {
        let config = SimulationConfig::default();
        let registry = StationRegistry::generate(&config, &mut FixedNoise::midpoint());
        assert_eq!(registry.len(), 123);

        let first = &registry.stations()[0];
        assert_eq!(first.id, "KURNOOL__AWS_0");
        assert_eq!(first.status, StationStatus::Normal);
        assert_eq!(first.initial_level, 100.0);

        let mock = &registry.stations()[3];
        assert_eq!(mock.name, "MOCK-HARYANA-0");
        assert_eq!(mock.id, "MOCK_HARYANA_0_3");
        assert!((mock.lat - 29.1).abs() < 1e-9);
        assert_eq!(mock.state, "Haryana");

        for station in registry.stations() {
            assert!((95.0..=105.0).contains(&station.initial_level));
        }
    }

    #[test]
    fn test_lookup() {
        let registry = StationRegistry::generate(&SimulationConfig::default(), &mut FixedNoise::low());
        assert!(registry.get("CHENNAI__CITY_1").is_some());
        assert!(registry.get("NOPE").is_none());
        assert_eq!(registry.get_or_first("NOPE").unwrap().id, "KURNOOL__AWS_0");
        assert!(StationRegistry::default().get_or_first("x").is_none());
    }
}
