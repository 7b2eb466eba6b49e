//! Mock data sources for the dashboard and the offline pipeline.
//!
//! Everything here draws randomness through `NoiseSource`, so a seed fully
//! determines a run.

pub mod feed;
pub mod noise;
pub mod sensor;
pub mod series;
pub mod stations;

// Re-export commonly used types
pub use feed::{FeedConfig, FeedError, Tick, TickFeed};
pub use noise::SeededNoise;
pub use sensor::{LiveReading, ReadingSimulator};
pub use series::{generate_series, series_start, DEFAULT_DAYS};
pub use stations::{
    allocation, sanitize_id, Region, Station, StationRegistry, StationStatus, StationType, REGIONS,
};
