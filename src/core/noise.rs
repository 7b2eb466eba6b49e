//! Injected randomness for jitter terms and mock data.
//!
//! Scoring never reaches for a global RNG. Callers hand in a `NoiseSource`,
//! which keeps the calculator deterministic under test.

use crate::config::JitterRange;

/// A source of uniformly distributed values.
pub trait NoiseSource {
    /// Draw a value from the closed interval `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Draw an index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Draw from a configured jitter range.
    fn jitter(&mut self, range: JitterRange) -> f64 {
        self.uniform(range.low, range.high)
    }
}

/// Deterministic source that always lands at the same fraction of a range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedNoise {
    fraction: f64,
}

impl FixedNoise {
    /// `fraction` is clamped to `[0, 1]`; 0 yields `low`, 1 yields `high`.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    pub fn low() -> Self {
        Self::new(0.0)
    }

    pub fn midpoint() -> Self {
        Self::new(0.5)
    }

    pub fn high() -> Self {
        Self::new(1.0)
    }
}

impl NoiseSource for FixedNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.fraction
    }

    fn index(&mut self, len: usize) -> usize {
        ((self.fraction * len as f64) as usize).min(len.saturating_sub(1))
    }
}
