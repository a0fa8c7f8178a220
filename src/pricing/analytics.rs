//! History analytics and scenario replay.

use tracing::debug;

use super::PricingEngine;
use crate::types::{
    CompetitiveAnalysis, Scenario, ScenarioCosts, ScenarioResult, TransactionCostTable,
};

/// Window for the weekly average price.
pub const WEEK_BLOCKS: usize = 5_040;
/// Window for the daily volatility figure.
pub const VOLATILITY_BLOCKS: usize = 168;
/// Targeted discount versus L1 fees.
pub const TARGET_L1_ADVANTAGE: f64 = 0.95;

pub const SIMPLE_TRANSFER_GAS: u64 = 21_000;
pub const ERC20_TRANSFER_GAS: u64 = 65_000;
pub const SMART_CONTRACT_GAS: u64 = 100_000;
pub const DEFI_OPERATION_GAS: u64 = 300_000;
pub const COMPLEX_DEFI_GAS: u64 = 500_000;

/// Sample standard deviation (n - 1 denominator).
///
/// Deviations are taken relative to the first value, so a constant
/// series yields exactly zero.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let shift = values[0];
    let n = values.len() as f64;
    let mean_offset = values.iter().map(|v| v - shift).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| (v - shift - mean_offset).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt()
}

impl PricingEngine {
    /// Mean of the last `blocks` prices, or of all of them if fewer exist
    /// or `blocks` is zero. Falls back to the base fee while history is empty.
    pub fn moving_average(&self, blocks: usize) -> f64 {
        let window = if blocks == 0 { self.history.len() } else { blocks };
        let recent: Vec<f64> = self.history.recent_prices(window).collect();
        if recent.is_empty() {
            return self.base_fee;
        }
        recent.iter().sum::<f64>() / recent.len() as f64
    }

    /// Sample standard deviation of the last `blocks` prices.
    /// Zero unless at least `blocks` (and at least two) prices exist.
    pub fn volatility(&self, blocks: usize) -> f64 {
        if blocks < 2 || self.history.len() < blocks {
            return 0.0;
        }
        let recent: Vec<f64> = self.history.recent_prices(blocks).collect();
        sample_std_dev(&recent)
    }

    pub fn competitive_analysis(&self, hour_utc: u32) -> CompetitiveAnalysis {
        CompetitiveAnalysis {
            zsnail_price: self.gas_price(hour_utc),
            target_l1_advantage: TARGET_L1_ADVANTAGE,
            avg_price_week: self.moving_average(WEEK_BLOCKS),
            price_volatility: self.volatility(VOLATILITY_BLOCKS),
            cost_per_transaction_types: TransactionCostTable {
                simple_transfer: self.estimate_transaction_cost(SIMPLE_TRANSFER_GAS, hour_utc),
                erc20_transfer: self.estimate_transaction_cost(ERC20_TRANSFER_GAS, hour_utc),
                smart_contract: self.estimate_transaction_cost(SMART_CONTRACT_GAS, hour_utc),
                complex_defi: self.estimate_transaction_cost(COMPLEX_DEFI_GAS, hour_utc),
            },
        }
    }

    /// Price each scenario against a copy of the current engine.
    ///
    /// Every scenario starts from the current state; absent overrides keep
    /// the current value. The engine's own state and history are untouched.
    pub fn simulate_network_conditions(
        &self,
        scenarios: &[Scenario],
        hour_utc: u32,
    ) -> Vec<ScenarioResult> {
        scenarios
            .iter()
            .map(|scenario| {
                let mut sandbox = self.clone();
                sandbox.update_network_state(
                    scenario.tps.unwrap_or(self.state.current_tps),
                    scenario.utilization.unwrap_or(self.state.current_utilization),
                    scenario.validators.unwrap_or(self.state.active_validators),
                    hour_utc,
                );

                let components = sandbox.pricing_components(hour_utc);
                debug!(
                    scenario = scenario.label(),
                    price = components.total_price,
                    "Scenario simulated"
                );

                ScenarioResult {
                    scenario: scenario.clone(),
                    gas_price: components.total_price,
                    components,
                    transaction_costs: ScenarioCosts {
                        simple_transfer: sandbox.estimate_transaction_cost(SIMPLE_TRANSFER_GAS, hour_utc),
                        erc20_transfer: sandbox.estimate_transaction_cost(ERC20_TRANSFER_GAS, hour_utc),
                        defi_operation: sandbox.estimate_transaction_cost(DEFI_OPERATION_GAS, hour_utc),
                    },
                }
            })
            .collect()
    }
}
