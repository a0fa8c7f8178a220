//! Hour-of-day weighting for the congestion charge.

use chrono::{Timelike, Utc};

use crate::config::TimeWeightsConfig;

/// 24-entry table of congestion weights indexed by UTC hour.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWeights {
    weights: [f64; 24],
}

impl TimeWeights {
    pub fn from_config(config: &TimeWeightsConfig) -> Self {
        let mut weights = [config.default_weight; 24];
        for &hour in &config.peak_hours {
            weights[hour as usize % 24] = config.peak_weight;
        }
        // Low hours are applied last and win on overlap.
        for &hour in &config.low_hours {
            weights[hour as usize % 24] = config.low_weight;
        }
        Self { weights }
    }

    /// Weight for a UTC hour. Hours past 23 wrap.
    pub fn weight(&self, hour_utc: u32) -> f64 {
        self.weights[hour_utc as usize % 24]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

impl Default for TimeWeights {
    fn default() -> Self {
        Self::from_config(&TimeWeightsConfig::default())
    }
}

/// Current hour of the day in UTC, read from the wall clock.
pub fn current_utc_hour() -> u32 {
    Utc::now().hour()
}

/// The configured reference hour, or the wall clock when none is set.
pub fn resolve_hour(reference_hour: Option<u32>) -> u32 {
    reference_hour.unwrap_or_else(current_utc_hour)
}
