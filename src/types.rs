//! Shared types for the gas pricing engine.
//!
//! These are the values the engine hands to its collaborators (the
//! driver, the dashboard, simulation harnesses). All of them serialize
//! to JSON so the dashboard can return them verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Network state
// ---------------------------------------------------------------------------

/// Telemetry of the most recently observed block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub current_tps: u64,
    /// Block utilization, always within 0.0–1.0.
    pub current_utilization: f64,
    pub active_validators: u32,
    pub max_validators: u32,
    /// Incremented once per state update.
    pub current_block: u64,
}

impl NetworkState {
    /// Fresh state before any telemetry has been ingested.
    pub fn genesis(active_validators: u32, max_validators: u32) -> Self {
        Self {
            current_tps: 0,
            current_utilization: 0.0,
            active_validators,
            max_validators,
            current_block: 0,
        }
    }

    /// Share of the validator set currently active (0.0 when the set is empty).
    pub fn validator_ratio(&self) -> f64 {
        if self.max_validators == 0 {
            return 0.0;
        }
        self.active_validators as f64 / self.max_validators as f64
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block #{} | {} TPS | {:.1}% util | {}/{} validators",
            self.current_block,
            self.current_tps,
            self.current_utilization * 100.0,
            self.active_validators,
            self.max_validators,
        )
    }
}

// ---------------------------------------------------------------------------
// Pricing breakdown
// ---------------------------------------------------------------------------

/// Breakdown of the current gas price into its four components.
///
/// `total_price` is clamped to the configured bounds, so in saturated
/// regimes it does not equal the sum of the other components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingComponents {
    pub base_fee: f64,
    pub priority_fee: f64,
    pub congestion_multiplier: f64,
    pub operational_cost: f64,
    pub total_price: f64,
    pub network_state: NetworkState,
}

impl PricingComponents {
    /// Unclamped sum of the four components.
    pub fn raw_sum(&self) -> f64 {
        self.base_fee + self.priority_fee + self.congestion_multiplier + self.operational_cost
    }

    /// Whether the total was pulled in by the price bounds.
    pub fn is_saturated(&self) -> bool {
        (self.raw_sum() - self.total_price).abs() > 1e-12
    }
}

impl fmt::Display for PricingComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "base_fee: {:.6}", self.base_fee)?;
        writeln!(f, "priority_fee: {:.6}", self.priority_fee)?;
        writeln!(f, "congestion_multiplier: {:.6}", self.congestion_multiplier)?;
        writeln!(f, "operational_cost: {:.6}", self.operational_cost)?;
        writeln!(f, "total_price: {:.6}", self.total_price)?;
        writeln!(f, "network_state:")?;
        writeln!(f, "  current_tps: {}", self.network_state.current_tps)?;
        writeln!(f, "  current_utilization: {}", self.network_state.current_utilization)?;
        writeln!(f, "  active_validators: {}", self.network_state.active_validators)?;
        write!(f, "  current_block: {}", self.network_state.current_block)
    }
}

// ---------------------------------------------------------------------------
// Competitive analysis
// ---------------------------------------------------------------------------

/// Estimated cost of four representative transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionCostTable {
    pub simple_transfer: f64,
    pub erc20_transfer: f64,
    pub smart_contract: f64,
    pub complex_defi: f64,
}

/// Snapshot of how the current price compares to recent history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub zsnail_price: f64,
    /// Targeted discount versus L1 (0.95 = 95% cheaper).
    pub target_l1_advantage: f64,
    /// Moving average over roughly one week of blocks.
    pub avg_price_week: f64,
    /// Sample standard deviation over roughly one day of blocks.
    pub price_volatility: f64,
    pub cost_per_transaction_types: TransactionCostTable,
}

// ---------------------------------------------------------------------------
// Scenario simulation
// ---------------------------------------------------------------------------

/// A what-if network condition. Absent fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tps: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<u32>,
}

impl Scenario {
    /// Fully specified, named scenario.
    pub fn named(name: &str, tps: u64, utilization: f64, validators: u32) -> Self {
        Self {
            name: Some(name.to_string()),
            tps: Some(tps),
            utilization: Some(utilization),
            validators: Some(validators),
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// The four reference conditions used by the driver.
    pub fn reference_set() -> Vec<Scenario> {
        vec![
            Scenario::named("Low Activity", 100, 0.1, 30),
            Scenario::named("Normal Activity", 5_000, 0.5, 60),
            Scenario::named("High Activity", 15_000, 0.8, 90),
            Scenario::named("Peak Congestion", 24_000, 0.95, 100),
        ]
    }
}

/// Estimated cost of the three transaction types reported per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCosts {
    pub simple_transfer: f64,
    pub erc20_transfer: f64,
    pub defi_operation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub gas_price: f64,
    pub components: PricingComponents,
    pub transaction_costs: ScenarioCosts,
}

// ---------------------------------------------------------------------------
// Base fee calibration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeDirection {
    Increase,
    Decrease,
    Hold,
}

impl fmt::Display for FeeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeDirection::Increase => write!(f, "INCREASE"),
            FeeDirection::Decrease => write!(f, "DECREASE"),
            FeeDirection::Hold => write!(f, "HOLD"),
        }
    }
}

/// Outcome of one calibration pass over the utilization window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseFeeAdjustment {
    pub previous: f64,
    pub updated: f64,
    pub average_utilization: f64,
    pub direction: FeeDirection,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures at the edges of the engine (configuration, outer surfaces).
/// Engine operations themselves normalise their inputs and never fail.
#[derive(Debug, thiserror::Error)]
pub enum GasPricingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid hour {0}: expected 0-23 (UTC)")]
    InvalidHour(u32),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
