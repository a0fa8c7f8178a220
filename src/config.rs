//! Configuration loading from TOML.
//!
//! Every field has a default matching the stock ZSnail economics, so a
//! missing or empty `config.toml` yields the reference engine. Values are
//! validated after parsing; the engine itself never re-checks them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::types::{GasPricingError, Scenario};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub economics: EconomicsConfig,
    pub network: NetworkConfig,
    pub calibration: CalibrationConfig,
    pub time_weights: TimeWeightsConfig,
    pub dashboard: DashboardConfig,
    pub driver: DriverConfig,
}

/// Fixed economic constants of the pricing formula.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EconomicsConfig {
    pub decimals: u8,
    pub min_gas_price: f64,
    pub max_gas_price: f64,
    pub block_time_secs: f64,
    pub max_block_gas: u64,
    pub target_utilization: f64,
    pub max_tps: u64,
    /// Infrastructure spend in USD per day.
    pub infrastructure_cost_per_day: f64,
    /// Tokens per USD.
    pub usd_to_token_rate: f64,
    pub profit_margin: f64,
    pub l2_discount: f64,
    pub min_priority_fee: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            decimals: 18,
            min_gas_price: 0.1,
            max_gas_price: 10.0,
            block_time_secs: 2.0,
            max_block_gas: 30_000_000,
            target_utilization: 0.5,
            max_tps: 25_000,
            infrastructure_cost_per_day: 100.0,
            usd_to_token_rate: 12_500.0,
            profit_margin: 1.2, // 20% profit
            l2_discount: 0.01,  // 99% cheaper than L1
            min_priority_fee: 0.1,
        }
    }
}

impl EconomicsConfig {
    /// Blocks produced per day at the configured block time.
    pub fn blocks_per_day(&self) -> f64 {
        86_400.0 / self.block_time_secs
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub initial_validators: u32,
    pub max_validators: u32,
    /// Cap on both price and utilization history.
    pub history_length: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            initial_validators: 50,
            max_validators: 100,
            history_length: 1000,
        }
    }
}

/// Hysteresis band for the adaptive base fee.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of most recent utilization samples averaged.
    pub window: usize,
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    /// Fractional step applied above/below the band (0.125 = 12.5%).
    pub adjustment: f64,
    /// How often the driver schedules a calibration pass, in blocks.
    pub interval_blocks: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window: 100,
            upper_threshold: 0.8,
            lower_threshold: 0.2,
            adjustment: 0.125,
            interval_blocks: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimeWeightsConfig {
    pub default_weight: f64,
    pub peak_weight: f64,
    pub low_weight: f64,
    /// UTC hours charged at `peak_weight`.
    pub peak_hours: Vec<u32>,
    /// UTC hours charged at `low_weight`.
    pub low_hours: Vec<u32>,
}

impl Default for TimeWeightsConfig {
    fn default() -> Self {
        Self {
            default_weight: 1.0,
            peak_weight: 1.5,
            low_weight: 0.7,
            peak_hours: (12..16).chain(20..24).collect(),
            low_hours: (4..8).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8645,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DriverConfig {
    /// Fixed UTC hour for time-weighted pricing. `None` reads the wall clock.
    pub reference_hour: Option<u32>,
    pub feed_interval_ms: u64,
    pub scenarios: Vec<Scenario>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            reference_hour: None,
            feed_interval_ms: 2_000,
            scenarios: Scenario::reference_set(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using default economics");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pricing formula cannot work with.
    pub fn validate(&self) -> Result<(), GasPricingError> {
        let eco = &self.economics;
        let err = |msg: &str| -> Result<(), GasPricingError> {
            Err(GasPricingError::Config(msg.to_string()))
        };

        if !(eco.min_gas_price >= 0.0 && eco.min_gas_price < eco.max_gas_price) {
            return err("min_gas_price must be non-negative and below max_gas_price");
        }
        if !eco.max_gas_price.is_finite() {
            return err("max_gas_price must be finite");
        }
        for (name, value) in [
            ("min_priority_fee", eco.min_priority_fee),
            ("infrastructure_cost_per_day", eco.infrastructure_cost_per_day),
            ("usd_to_token_rate", eco.usd_to_token_rate),
            ("profit_margin", eco.profit_margin),
            ("l2_discount", eco.l2_discount),
        ] {
            if !is_non_negative(value) {
                return Err(GasPricingError::Config(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        if !(eco.block_time_secs > 0.0) {
            return err("block_time_secs must be positive");
        }
        if eco.max_tps == 0 {
            return err("max_tps must be positive");
        }
        if self.network.max_validators == 0 {
            return err("max_validators must be positive");
        }
        if self.network.history_length == 0 {
            return err("history_length must be positive");
        }

        let cal = &self.calibration;
        if cal.window == 0 || cal.window > self.network.history_length {
            return err("calibration window must be within 1..=history_length");
        }
        if !(cal.lower_threshold < cal.upper_threshold) {
            return err("calibration lower_threshold must be below upper_threshold");
        }
        if !(cal.adjustment > 0.0 && cal.adjustment < 1.0) {
            return err("calibration adjustment must be within (0, 1)");
        }

        let tw = &self.time_weights;
        for (name, value) in [
            ("default_weight", tw.default_weight),
            ("peak_weight", tw.peak_weight),
            ("low_weight", tw.low_weight),
        ] {
            if !is_non_negative(value) {
                return Err(GasPricingError::Config(format!(
                    "time weight {name} must be finite and non-negative"
                )));
            }
        }
        if let Some(&hour) = tw.peak_hours.iter().chain(&tw.low_hours).find(|&&h| h >= 24) {
            return Err(GasPricingError::InvalidHour(hour));
        }
        if let Some(hour) = self.driver.reference_hour.filter(|&h| h >= 24) {
            return Err(GasPricingError::InvalidHour(hour));
        }

        Ok(())
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
