//! Round-robin telemetry replay used by the driver's live mode.
//!
//! Each step feeds the next configured scenario into the engine as a new
//! block and runs a calibration pass every `calibration_interval` blocks.

use tracing::debug;

use crate::pricing::PricingEngine;
use crate::types::{BaseFeeAdjustment, Scenario};

/// What one feed step did to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedStep {
    pub block: u64,
    pub scenario: String,
    pub gas_price: f64,
    pub adjustment: Option<BaseFeeAdjustment>,
}

pub struct TelemetryFeed {
    scenarios: Vec<Scenario>,
    cursor: usize,
    calibration_interval: u64,
}

impl TelemetryFeed {
    pub fn new(scenarios: Vec<Scenario>, calibration_interval: u64) -> Self {
        Self {
            scenarios,
            cursor: 0,
            calibration_interval,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Apply the next scenario. Returns `None` when there is nothing to replay.
    pub fn step(&mut self, engine: &mut PricingEngine, hour_utc: u32) -> Option<FeedStep> {
        if self.scenarios.is_empty() {
            return None;
        }
        let scenario = &self.scenarios[self.cursor % self.scenarios.len()];
        self.cursor = self.cursor.wrapping_add(1);

        let current = *engine.network_state();
        engine.update_network_state(
            scenario.tps.unwrap_or(current.current_tps),
            scenario.utilization.unwrap_or(current.current_utilization),
            scenario.validators.unwrap_or(current.active_validators),
            hour_utc,
        );

        let block = engine.network_state().current_block;
        let adjustment = if self.calibration_interval > 0 && block % self.calibration_interval == 0 {
            engine.update_base_fee()
        } else {
            None
        };

        let gas_price = engine.gas_price(hour_utc);
        debug!(block, scenario = scenario.label(), gas_price, "Telemetry fed");

        Some(FeedStep {
            block,
            scenario: scenario.label().to_string(),
            gas_price,
            adjustment,
        })
    }
}
