//! Long-running engine lifecycle: telemetry ingestion, history bounds
//! and caller-scheduled base fee calibration.

use zsnail_gas::config::AppConfig;
use zsnail_gas::feed::TelemetryFeed;
use zsnail_gas::pricing::PricingEngine;
use zsnail_gas::types::{FeeDirection, Scenario};

const HOUR: u32 = 10;

#[test]
fn test_history_lengths_track_updates() {
    let mut engine = PricingEngine::new();
    for n in 1..=1_200u64 {
        engine.update_network_state(n % 25_000, (n % 10) as f64 / 10.0, 50, HOUR);
        let expected = (n as usize).min(1_000);
        assert_eq!(engine.history().len(), expected);
        assert_eq!(engine.history().utilization_len(), expected);
    }
    assert_eq!(engine.network_state().current_block, 1_200);
}

#[test]
fn test_prices_always_within_bounds() {
    let mut engine = PricingEngine::new();
    let inputs = [
        (0, 0.0, 0),
        (1_000_000_000, 1.0, 0),
        (u64::MAX, 5.0, u32::MAX),
        (25_000, -1.0, 100),
        (12_345, f64::INFINITY, 7),
    ];
    for hour in 0..24 {
        for &(tps, u, v) in &inputs {
            engine.update_network_state(tps, u, v, hour);
            let price = engine.gas_price(hour);
            assert!((0.1..=10.0).contains(&price), "price {price} out of bounds");
        }
    }
    assert!(engine.history().recent_prices(usize::MAX).all(|p| (0.1..=10.0).contains(&p)));
}

#[test]
fn test_scheduled_calibration_tracks_load() {
    let mut engine = PricingEngine::new();
    let initial = engine.base_fee();

    // Sustained congestion: fee rises once per window.
    let mut feed = TelemetryFeed::new(vec![Scenario::named("Congested", 22_000, 0.9, 100)], 100);
    let raises = (0..300)
        .filter_map(|_| feed.step(&mut engine, HOUR))
        .filter_map(|step| step.adjustment)
        .filter(|adj| adj.direction == FeeDirection::Increase)
        .count();
    assert_eq!(raises, 3);
    assert!((engine.base_fee() - initial * 1.125f64.powi(3)).abs() < 1e-9);

    // Quiet network: the next window pulls it back down.
    let mut feed = TelemetryFeed::new(vec![Scenario::named("Quiet", 50, 0.05, 40)], 100);
    let raised = engine.base_fee();
    for _ in 0..100 {
        feed.step(&mut engine, HOUR);
    }
    assert!((engine.base_fee() - raised * 0.875).abs() < 1e-9);
}

#[test]
fn test_calibration_raises_subsequent_prices() {
    let mut engine = PricingEngine::new();
    for _ in 0..100 {
        engine.update_network_state(20_000, 0.95, 100, HOUR);
    }
    let before = engine.gas_price(HOUR);
    engine.update_base_fee().expect("full window");
    assert!(engine.gas_price(HOUR) > before);
}

#[test]
fn test_custom_config_flows_through() {
    let cfg = AppConfig::from_toml(
        r#"
        [economics]
        max_gas_price = 1.0

        [network]
        history_length = 200

        [calibration]
        window = 50
        "#,
    )
    .unwrap();
    let mut engine = PricingEngine::from_config(&cfg).unwrap();

    for _ in 0..250 {
        engine.update_network_state(24_000, 0.95, 100, HOUR);
    }
    assert_eq!(engine.history().len(), 200);
    assert_eq!(engine.gas_price(HOUR), 1.0);

    let adj = engine.update_base_fee().unwrap();
    assert_eq!(adj.direction, FeeDirection::Increase);
    // Base fee ceiling is a quarter of the max price.
    assert!(engine.base_fee() <= 0.25);
}
