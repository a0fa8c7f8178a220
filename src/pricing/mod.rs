//! Gas pricing engine.
//!
//! Price = base fee + priority fee + congestion charge + operational cost,
//! clamped to the configured bounds. The base fee starts from the
//! infrastructure cost per block and is nudged by `update_base_fee`, which
//! callers schedule themselves (the engine never self-calibrates).
//!
//! Every result that depends on the hour-of-day weight takes the UTC hour
//! explicitly; reading the wall clock is left to the caller.

pub mod analytics;
pub mod history;
pub mod time_weight;

use tracing::{debug, info};

use crate::config::{AppConfig, CalibrationConfig, EconomicsConfig};
use crate::types::{
    BaseFeeAdjustment, FeeDirection, GasPricingError, NetworkState, PricingComponents,
};
use history::PriceHistory;
use time_weight::TimeWeights;

/// Gas units are scaled by this before multiplying with the price.
const GAS_SCALING: f64 = 1_000_000.0;

/// Transactions beyond this count earn no further batch discount.
const MAX_DISCOUNTED_TXS: u64 = 100;

/// Discount per transaction in a batch (0.5%).
const DISCOUNT_PER_TX: f64 = 0.005;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PricingEngine {
    economics: EconomicsConfig,
    calibration: CalibrationConfig,
    time_weights: TimeWeights,
    state: NetworkState,
    base_fee: f64,
    history: PriceHistory,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingEngine {
    /// Engine with the stock economic constants.
    pub fn new() -> Self {
        Self::build(&AppConfig::default())
    }

    /// Engine from a configuration, validating it first.
    pub fn from_config(config: &AppConfig) -> Result<Self, GasPricingError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &AppConfig) -> Self {
        let economics = config.economics.clone();
        let base_fee = Self::initial_base_fee(&economics)
            .min(economics.max_gas_price / 4.0)
            .max(economics.min_gas_price / 4.0);
        Self {
            calibration: config.calibration.clone(),
            time_weights: TimeWeights::from_config(&config.time_weights),
            state: NetworkState::genesis(
                config.network.initial_validators,
                config.network.max_validators,
            ),
            base_fee,
            history: PriceHistory::new(config.network.history_length),
            economics,
        }
    }

    /// B = (IC / BPD) * PM * LD * rate
    ///
    /// Cost per block in USD, marked up by the profit margin, discounted
    /// for L2 and converted to tokens.
    pub fn initial_base_fee(economics: &EconomicsConfig) -> f64 {
        let cost_per_block_usd = economics.infrastructure_cost_per_day / economics.blocks_per_day();
        cost_per_block_usd * economics.profit_margin * economics.l2_discount * economics.usd_to_token_rate
    }

    // -- Accessors ----------------------------------------------------------

    pub fn base_fee(&self) -> f64 {
        self.base_fee
    }

    pub fn network_state(&self) -> &NetworkState {
        &self.state
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn economics(&self) -> &EconomicsConfig {
        &self.economics
    }

    pub fn time_weights(&self) -> &TimeWeights {
        &self.time_weights
    }

    /// Bounds the base fee is kept within: a quarter of the price bounds.
    pub fn base_fee_bounds(&self) -> (f64, f64) {
        (self.economics.min_gas_price / 4.0, self.economics.max_gas_price / 4.0)
    }

    // -- Formula layer --------------------------------------------------------

    /// F = Fmin * (1 + (TPS / TPS_max)^2), or exactly Fmin when idle.
    pub fn priority_fee(&self) -> f64 {
        let min_priority = self.economics.min_priority_fee;
        if self.state.current_tps == 0 {
            return min_priority;
        }
        let demand = self.state.current_tps as f64 / self.economics.max_tps as f64;
        min_priority * (1.0 + demand.powi(2))
    }

    /// C = BaseFee * u^3 * w(hour); zero when utilization is zero.
    pub fn congestion_multiplier(&self, hour_utc: u32) -> f64 {
        let utilization = self.state.current_utilization;
        if utilization == 0.0 {
            return 0.0;
        }
        self.base_fee * (utilization.powi(3) * self.time_weights.weight(hour_utc))
    }

    /// O = validator share * 0.05 + storage 0.001 + (TPS / 100) * 0.002
    pub fn operational_cost(&self) -> f64 {
        let validator_cost = self.state.validator_ratio() * 0.05;
        let storage_cost = 0.001;
        let network_cost = (self.state.current_tps as f64 / 100.0) * 0.002;
        validator_cost + storage_cost + network_cost
    }

    /// Sum of all four components, clamped to the price bounds.
    pub fn gas_price(&self, hour_utc: u32) -> f64 {
        let total = self.base_fee
            + self.priority_fee()
            + self.congestion_multiplier(hour_utc)
            + self.operational_cost();
        // min before max: a NaN sum resolves to the upper bound.
        total.min(self.economics.max_gas_price).max(self.economics.min_gas_price)
    }

    pub fn estimate_transaction_cost(&self, gas_used: u64, hour_utc: u32) -> f64 {
        gas_used as f64 * self.gas_price(hour_utc) / GAS_SCALING
    }

    /// Price multiplier for a batch: 0.5% off per transaction, capped at 50%.
    pub fn batch_discount(&self, tx_count: u64) -> f64 {
        if tx_count <= 1 {
            return 1.0;
        }
        let discounted = tx_count.min(MAX_DISCOUNTED_TXS);
        1.0 - discounted as f64 * DISCOUNT_PER_TX
    }

    pub fn pricing_components(&self, hour_utc: u32) -> PricingComponents {
        PricingComponents {
            base_fee: self.base_fee,
            priority_fee: self.priority_fee(),
            congestion_multiplier: self.congestion_multiplier(hour_utc),
            operational_cost: self.operational_cost(),
            total_price: self.gas_price(hour_utc),
            network_state: self.state,
        }
    }

    // -- State transitions ----------------------------------------------------

    /// Ingest telemetry for a new block and record the resulting price.
    ///
    /// Utilization is clamped to 0.0–1.0 (NaN becomes 0.0); TPS and the
    /// validator count are taken verbatim.
    pub fn update_network_state(&mut self, tps: u64, utilization: f64, validators: u32, hour_utc: u32) {
        self.state.current_tps = tps;
        self.state.current_utilization = utilization.max(0.0).min(1.0);
        self.state.active_validators = validators;
        self.state.current_block += 1;

        let price = self.gas_price(hour_utc);
        self.history.push(price, self.state.current_utilization);

        debug!(
            block = self.state.current_block,
            tps,
            utilization = self.state.current_utilization,
            validators,
            price,
            "Network state updated"
        );
    }

    /// Adapt the base fee to the mean utilization of the recent window.
    ///
    /// Above the upper threshold the fee rises by the adjustment step,
    /// below the lower one it falls; inside the band it holds. Returns
    /// `None` without touching the fee until a full window is recorded.
    pub fn update_base_fee(&mut self) -> Option<BaseFeeAdjustment> {
        let window = self.calibration.window;
        if self.history.utilization_len() < window {
            debug!(
                samples = self.history.utilization_len(),
                required = window,
                "Not enough utilization samples to calibrate base fee"
            );
            return None;
        }

        let average_utilization =
            self.history.recent_utilization(window).sum::<f64>() / window as f64;

        let previous = self.base_fee;
        let (direction, factor) = if average_utilization > self.calibration.upper_threshold {
            (FeeDirection::Increase, 1.0 + self.calibration.adjustment)
        } else if average_utilization < self.calibration.lower_threshold {
            (FeeDirection::Decrease, 1.0 - self.calibration.adjustment)
        } else {
            (FeeDirection::Hold, 1.0)
        };

        let (min_base, max_base) = self.base_fee_bounds();
        self.base_fee = (previous * factor).min(max_base).max(min_base);

        info!(
            old = format!("{previous:.6}"),
            new = format!("{:.6}", self.base_fee),
            avg_utilization = format!("{average_utilization:.3}"),
            direction = %direction,
            "Base fee adjusted"
        );

        Some(BaseFeeAdjustment {
            previous,
            updated: self.base_fee,
            average_utilization,
            direction,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const NOON: u32 = 12; // peak hour, weight 1.5
    const MIDNIGHT: u32 = 0; // weight 1.0
    const DAWN: u32 = 5; // low hour, weight 0.7

    fn engine_with(tps: u64, utilization: f64, validators: u32) -> PricingEngine {
        let mut engine = PricingEngine::new();
        engine.update_network_state(tps, utilization, validators, MIDNIGHT);
        engine
    }

    fn fill(engine: &mut PricingEngine, n: usize, utilization: f64) {
        for _ in 0..n {
            engine.update_network_state(1_000, utilization, 50, MIDNIGHT);
        }
    }

    #[test]
    fn test_initial_base_fee() {
        let engine = PricingEngine::new();
        // (100 / 43200) * 1.2 * 0.01 * 12500
        let expected = 100.0 / 43_200.0 * 1.2 * 0.01 * 12_500.0;
        assert!((engine.base_fee() - expected).abs() < 1e-12);
        assert!((engine.base_fee() - 0.347_222).abs() < 1e-6);
    }

    #[test]
    fn test_priority_fee_idle_is_minimum() {
        let engine = PricingEngine::new();
        assert_eq!(engine.priority_fee(), 0.1);
    }

    #[test]
    fn test_priority_fee_monotonic_in_tps() {
        let mut previous = 0.0;
        for tps in [0, 1, 100, 5_000, 12_500, 25_000, 50_000, 1_000_000] {
            let fee = engine_with(tps, 0.5, 50).priority_fee();
            assert!(fee >= previous, "fee {fee} at tps {tps} below {previous}");
            previous = fee;
        }
        // Full TPS doubles the minimum.
        assert!((engine_with(25_000, 0.5, 50).priority_fee() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_congestion_zero_at_zero_utilization() {
        let engine = engine_with(5_000, 0.0, 50);
        for hour in 0..24 {
            assert_eq!(engine.congestion_multiplier(hour), 0.0);
        }
    }

    #[test]
    fn test_congestion_monotonic_in_utilization() {
        let mut previous = 0.0;
        for step in 0..=20 {
            let u = step as f64 / 20.0;
            let c = engine_with(5_000, u, 50).congestion_multiplier(NOON);
            assert!(c >= previous, "congestion {c} at u={u} below {previous}");
            previous = c;
        }
    }

    #[test]
    fn test_congestion_uses_time_weight() {
        let engine = engine_with(5_000, 1.0, 50);
        let base = engine.base_fee();
        assert!((engine.congestion_multiplier(MIDNIGHT) - base).abs() < 1e-12);
        assert!((engine.congestion_multiplier(NOON) - base * 1.5).abs() < 1e-12);
        assert!((engine.congestion_multiplier(DAWN) - base * 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_operational_cost() {
        let engine = engine_with(100, 0.1, 30);
        // 0.3 * 0.05 + 0.001 + 1 * 0.002
        assert!((engine.operational_cost() - 0.018).abs() < 1e-12);

        let idle = PricingEngine::new();
        // 50/100 * 0.05 + 0.001
        assert!((idle.operational_cost() - 0.026).abs() < 1e-12);
    }

    #[test]
    fn test_low_activity_price() {
        let engine = engine_with(100, 0.1, 30);
        let price = engine.gas_price(MIDNIGHT);
        // base 0.3472 + priority ~0.1 + congestion 0.00035 + op 0.018
        assert!(price > 0.46 && price < 0.47, "price {price}");
        let priority_share = (engine.base_fee() + engine.priority_fee()) / price;
        assert!(priority_share > 0.9);
    }

    #[test]
    fn test_peak_congestion_price() {
        let engine = engine_with(24_000, 0.95, 100);
        let c = engine.pricing_components(NOON);
        assert!((c.congestion_multiplier - c.base_fee * 0.95f64.powi(3) * 1.5).abs() < 1e-12);
        assert!((c.priority_fee - 0.1 * (1.0 + 0.96f64.powi(2))).abs() < 1e-12);
        assert!((c.operational_cost - 0.531).abs() < 1e-9);
        assert!(!c.is_saturated());
        assert!(c.total_price > 1.5 && c.total_price < 1.52, "total {}", c.total_price);
        // Peak pricing is roughly three times the quiet-hour low-activity price.
        assert!(c.total_price > 3.0 * engine_with(100, 0.1, 30).gas_price(MIDNIGHT));
    }

    #[test]
    fn test_gas_price_bounds_pathological() {
        let engine = engine_with(1_000_000_000, 1.0, 0);
        for hour in 0..24 {
            assert_eq!(engine.gas_price(hour), 10.0);
        }
        let c = engine.pricing_components(NOON);
        assert!(c.is_saturated());
        assert!(c.raw_sum() > c.total_price);

        let nan = engine_with(0, f64::NAN, 0);
        let price = nan.gas_price(NOON);
        assert!((0.1..=10.0).contains(&price));
        assert_eq!(nan.network_state().current_utilization, 0.0);
    }

    #[test]
    fn test_gas_price_lower_bound() {
        let mut config = AppConfig::default();
        config.economics.min_gas_price = 2.0;
        let engine = PricingEngine::from_config(&config).unwrap();
        assert_eq!(engine.gas_price(MIDNIGHT), 2.0);
    }

    #[test]
    fn test_utilization_clamped() {
        let high = engine_with(10, 3.5, 50);
        assert_eq!(high.network_state().current_utilization, 1.0);
        let low = engine_with(10, -0.4, 50);
        assert_eq!(low.network_state().current_utilization, 0.0);
        assert_eq!(low.history().recent_utilization(1).next(), Some(0.0));
    }

    #[test]
    fn test_transaction_cost_scaling() {
        let engine = engine_with(5_000, 0.5, 60);
        let price = engine.gas_price(MIDNIGHT);
        let cost = engine.estimate_transaction_cost(21_000, MIDNIGHT);
        assert!((cost - 21_000.0 * price / 1_000_000.0).abs() < 1e-15);
        assert_eq!(engine.estimate_transaction_cost(0, MIDNIGHT), 0.0);
    }

    #[test]
    fn test_batch_discount() {
        let engine = PricingEngine::new();
        assert_eq!(engine.batch_discount(0), 1.0);
        assert_eq!(engine.batch_discount(1), 1.0);
        assert!((engine.batch_discount(2) - 0.99).abs() < 1e-12);
        assert!((engine.batch_discount(100) - 0.5).abs() < 1e-12);
        assert_eq!(engine.batch_discount(1000), engine.batch_discount(100));
        assert_eq!(engine.batch_discount(u64::MAX), engine.batch_discount(100));
    }

    #[test]
    fn test_update_state_records_history() {
        let mut engine = PricingEngine::new();
        engine.update_network_state(5_000, 0.5, 60, NOON);
        let state = engine.network_state();
        assert_eq!(state.current_block, 1);
        assert_eq!(state.current_tps, 5_000);
        assert_eq!(state.active_validators, 60);
        assert_eq!(state.max_validators, 100);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.history().latest_price(), Some(engine.gas_price(NOON)));
    }

    #[test]
    fn test_history_capped() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 1_005, 0.5);
        assert_eq!(engine.history().len(), 1_000);
        assert_eq!(engine.history().utilization_len(), 1_000);
        assert_eq!(engine.network_state().current_block, 1_005);
    }

    #[test]
    fn test_base_fee_noop_without_window() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 99, 0.95);
        let before = engine.base_fee();
        assert!(engine.update_base_fee().is_none());
        assert_eq!(engine.base_fee(), before);
    }

    #[test]
    fn test_base_fee_increase() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 100, 0.9);
        let before = engine.base_fee();
        let adj = engine.update_base_fee().unwrap();
        assert_eq!(adj.direction, FeeDirection::Increase);
        assert_eq!(adj.previous, before);
        assert!((engine.base_fee() - before * 1.125).abs() < 1e-12);
        assert!((adj.average_utilization - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_base_fee_decrease() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 100, 0.1);
        let before = engine.base_fee();
        let adj = engine.update_base_fee().unwrap();
        assert_eq!(adj.direction, FeeDirection::Decrease);
        assert!((engine.base_fee() - before * 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_base_fee_dead_zone() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 100, 0.5);
        let before = engine.base_fee();
        let adj = engine.update_base_fee().unwrap();
        assert_eq!(adj.direction, FeeDirection::Hold);
        assert_eq!(engine.base_fee(), before);
    }

    #[test]
    fn test_base_fee_uses_latest_window_only() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 300, 0.95);
        fill(&mut engine, 100, 0.5);
        let before = engine.base_fee();
        engine.update_base_fee();
        assert_eq!(engine.base_fee(), before);
    }

    #[test]
    fn test_base_fee_clamped() {
        let mut engine = PricingEngine::new();
        fill(&mut engine, 100, 1.0);
        for _ in 0..50 {
            engine.update_base_fee();
        }
        assert_eq!(engine.base_fee(), 2.5);

        fill(&mut engine, 100, 0.0);
        for _ in 0..50 {
            engine.update_base_fee();
        }
        assert_eq!(engine.base_fee(), 0.025);
    }

    #[test]
    fn test_update_state_does_not_calibrate() {
        let mut engine = PricingEngine::new();
        let before = engine.base_fee();
        fill(&mut engine, 500, 1.0);
        assert_eq!(engine.base_fee(), before);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = AppConfig::default();
        config.economics.block_time_secs = 0.0;
        assert!(PricingEngine::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_rejects_negative_weight() {
        let mut config = AppConfig::default();
        config.time_weights.low_weight = -5.0;
        assert!(matches!(
            PricingEngine::from_config(&config),
            Err(GasPricingError::Config(_))
        ));
    }
}
