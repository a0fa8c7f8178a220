//! ZSnail gas pricing driver.
//!
//! Loads configuration, initialises structured logging, prints the
//! reference scenario table and analysis, and (when the dashboard is
//! enabled) serves the monitoring API while replaying telemetry until
//! Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use zsnail_gas::config::AppConfig;
use zsnail_gas::dashboard::{self, routes::DashboardState};
use zsnail_gas::feed::TelemetryFeed;
use zsnail_gas::pricing::time_weight::resolve_hour;
use zsnail_gas::pricing::PricingEngine;
use zsnail_gas::report;

const BANNER: &str = "ZSnail L2 Gas Pricing Calculator";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("ZSNAIL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;

    if let Some(hour) = cfg.driver.reference_hour {
        warn!(hour, "Using fixed reference hour instead of the wall clock");
    }
    let hour = resolve_hour(cfg.driver.reference_hour);

    let mut engine = PricingEngine::from_config(&cfg).context("Invalid pricing configuration")?;
    info!(
        base_fee = engine.base_fee(),
        hour_utc = hour,
        history_length = cfg.network.history_length,
        "Pricing engine ready"
    );

    // -- Reference report ------------------------------------------------

    println!("{BANNER}");
    println!("{}", "=".repeat(50));
    println!("Initial base fee: {:.6} ZSNAIL", engine.base_fee());
    println!("Initial gas price: {:.6} ZSNAIL", engine.gas_price(hour));
    println!();

    print!("{}", report::scenario_table(&mut engine, &cfg.driver.scenarios, hour));
    println!();

    engine.update_network_state(24_000, 0.95, 100, hour);
    print!(
        "{}",
        report::components_report("Detailed Analysis for Peak Congestion:", &engine, hour)
    );
    println!();
    print!("{}", report::analysis_report(&engine.competitive_analysis(hour)));

    if !cfg.dashboard.enabled {
        return Ok(());
    }

    // -- Live mode -------------------------------------------------------

    let state = Arc::new(DashboardState::new(engine, cfg.driver.reference_hour));
    dashboard::spawn_dashboard(state.clone(), cfg.dashboard.port).await?;

    let mut feed = TelemetryFeed::new(cfg.driver.scenarios.clone(), cfg.calibration.interval_blocks);
    let mut interval = tokio::time::interval(Duration::from_millis(cfg.driver.feed_interval_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_ms = cfg.driver.feed_interval_ms,
        scenarios = cfg.driver.scenarios.len(),
        calibration_interval = cfg.calibration.interval_blocks,
        "Replaying telemetry. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick(), if !feed.is_empty() => {
                let mut engine = state.engine.write().await;
                let hour = resolve_hour(state.reference_hour);
                if let Some(step) = feed.step(&mut engine, hour) {
                    if let Some(adj) = step.adjustment {
                        info!(
                            block = step.block,
                            old = adj.previous,
                            new = adj.updated,
                            "Scheduled base fee calibration"
                        );
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    let engine = state.engine.read().await;
    info!(
        blocks = engine.network_state().current_block,
        base_fee = format!("{:.6}", engine.base_fee()),
        gas_price = format!("{:.6}", engine.gas_price(resolve_hour(state.reference_hour))),
        "Driver shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("zsnail_gas=info"));

    if std::env::var("ZSNAIL_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
