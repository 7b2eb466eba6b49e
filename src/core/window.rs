//! Bounded rolling history of recent readings.
//!
//! The window is owned by the dashboard state. Scorers only ever see it by
//! shared reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// One entry of the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedReading {
    pub timestamp: DateTime<Utc>,
    /// Observed water level (m)
    pub water_level: f64,
    /// Next-day forecast made at this tick, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_level: Option<f64>,
}

impl WindowedReading {
    pub fn new(timestamp: DateTime<Utc>, water_level: f64) -> Self {
        Self {
            timestamp,
            water_level,
            predicted_level: None,
        }
    }

    pub fn with_prediction(mut self, predicted_level: f64) -> Self {
        self.predicted_level = Some(predicted_level);
        self
    }
}

/// Descriptive statistics over the levels currently in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (0 with fewer than two readings)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Fixed-capacity, append-with-eviction buffer of the most recent readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    capacity: usize,
    readings: VecDeque<WindowedReading>,
}

impl RollingWindow {
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, returning the oldest one if it was evicted.
    pub fn push(&mut self, reading: WindowedReading) -> Option<WindowedReading> {
        let evicted = if self.readings.len() == self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.readings.len() == self.capacity
    }

    /// Readings from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &WindowedReading> {
        self.readings.iter()
    }

    pub fn latest(&self) -> Option<&WindowedReading> {
        self.readings.back()
    }

    pub fn levels(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.water_level).collect()
    }

    /// Mean per-tick change in level across the window.
    pub fn trend(&self) -> Option<f64> {
        if self.readings.len() < 2 {
            return None;
        }
        let first = self.readings.front()?.water_level;
        let last = self.readings.back()?.water_level;
        Some((last - first) / (self.readings.len() - 1) as f64)
    }

    pub fn summary(&self) -> Option<WindowSummary> {
        if self.readings.is_empty() {
            return None;
        }
        let levels = self.levels();
        let std_dev = if levels.len() < 2 {
            0.0
        } else {
            levels.iter().std_dev()
        };

        Some(WindowSummary {
            count: levels.len(),
            mean: levels.iter().mean(),
            std_dev,
            min: Statistics::min(levels.iter()),
            max: Statistics::max(levels.iter()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(offset: i64, level: f64) -> WindowedReading {
        WindowedReading::new(Utc::now() + Duration::seconds(offset), level)
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut window = RollingWindow::new(3);
        assert!(window.push(reading(0, 1.0)).is_none());
        assert!(window.push(reading(1, 2.0)).is_none());
        assert!(window.push(reading(2, 3.0)).is_none());
        assert!(window.is_full());

        let evicted = window.push(reading(3, 4.0)).unwrap();
        assert_eq!(evicted.water_level, 1.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.levels(), vec![2.0, 3.0, 4.0]);
        assert_eq!(window.latest().unwrap().water_level, 4.0);
    }

    #[test]
    fn test_zero_capacity_raised() {
        let mut window = RollingWindow::new(0);
        window.push(reading(0, 1.0));
        window.push(reading(1, 2.0));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.levels(), vec![2.0]);
    }

    #[test]
    fn test_trend() {
        let mut window = RollingWindow::new(20);
        assert!(window.trend().is_none());
        for (i, level) in [100.0, 100.5, 101.0, 101.5].iter().enumerate() {
            window.push(reading(i as i64, *level));
        }
        assert!((window.trend().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_summary() {
        let mut window = RollingWindow::new(20);
        assert!(window.summary().is_none());

        window.push(reading(0, 98.0));
        assert_eq!(window.summary().unwrap().std_dev, 0.0);

        window.push(reading(1, 102.0));
        let summary = window.summary().unwrap();
        assert_eq!(summary.count, 2);
        assert!((summary.mean - 100.0).abs() < 1e-12);
        assert_eq!(summary.min, 98.0);
        assert_eq!(summary.max, 102.0);
        assert!((summary.std_dev - 8.0_f64.sqrt()).abs() < 1e-9);
    }
}
