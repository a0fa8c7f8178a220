//! Plain-text reports printed by the driver.

use crate::pricing::analytics::SIMPLE_TRANSFER_GAS;
use crate::pricing::PricingEngine;
use crate::types::{CompetitiveAnalysis, Scenario};

const RULE_WIDE: usize = 80;

/// Feed each scenario through the engine as live telemetry and tabulate
/// the resulting prices. Unlike simulation, this advances the engine.
pub fn scenario_table(engine: &mut PricingEngine, scenarios: &[Scenario], hour_utc: u32) -> String {
    let rule = "-".repeat(RULE_WIDE);
    let mut out = String::from("Gas Pricing Scenarios:\n");
    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!(
        "{:<15} {:<8} {:<6} {:<12} {:<12}\n",
        "Scenario", "TPS", "Util%", "Gas Price", "Transfer Cost"
    ));
    out.push_str(&format!("{rule}\n"));

    for scenario in scenarios {
        let current = *engine.network_state();
        let tps = scenario.tps.unwrap_or(current.current_tps);
        let utilization = scenario.utilization.unwrap_or(current.current_utilization);
        let validators = scenario.validators.unwrap_or(current.active_validators);

        engine.update_network_state(tps, utilization, validators, hour_utc);

        out.push_str(&format!(
            "{:<15} {:<8} {:<5.1}% {:<12.6} {:<12.8}\n",
            scenario.label(),
            tps,
            engine.network_state().current_utilization * 100.0,
            engine.gas_price(hour_utc),
            engine.estimate_transaction_cost(SIMPLE_TRANSFER_GAS, hour_utc),
        ));
    }

    out
}

pub fn components_report(title: &str, engine: &PricingEngine, hour_utc: u32) -> String {
    format!(
        "{title}\n{}\n{}\n",
        "-".repeat(50),
        engine.pricing_components(hour_utc)
    )
}

pub fn analysis_report(analysis: &CompetitiveAnalysis) -> String {
    let costs = &analysis.cost_per_transaction_types;
    let mut out = format!(
        "Competitive Analysis:\n{}\n\
         zsnail_price: {}\n\
         target_l1_advantage: {}\n\
         avg_price_week: {}\n\
         price_volatility: {}\n\
         cost_per_transaction_types:\n",
        "-".repeat(30),
        analysis.zsnail_price,
        analysis.target_l1_advantage,
        analysis.avg_price_week,
        analysis.price_volatility,
    );
    for (name, cost) in [
        ("simple_transfer", costs.simple_transfer),
        ("erc20_transfer", costs.erc20_transfer),
        ("smart_contract", costs.smart_contract),
        ("complex_defi", costs.complex_defi),
    ] {
        out.push_str(&format!("  {name}: {cost:.8} ZSNAIL\n"));
    }

    out
}
