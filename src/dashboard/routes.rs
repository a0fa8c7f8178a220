//! Dashboard API route handlers.
//!
//! All endpoints return JSON. The engine is shared behind a single
//! `RwLock` so a state update is observed atomically by every reader.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::pricing::history::HistorySample;
use crate::pricing::time_weight::resolve_hour;
use crate::pricing::PricingEngine;
use crate::types::{
    BaseFeeAdjustment, CompetitiveAnalysis, GasPricingError, PricingComponents, Scenario,
    ScenarioResult,
};

/// Upper bound on scenarios per simulation request (each clones the engine).
pub const MAX_SCENARIOS_PER_REQUEST: usize = 64;

const DEFAULT_HISTORY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct DashboardState {
    pub engine: RwLock<PricingEngine>,
    /// Fixed UTC hour for time-weighted pricing; wall clock when `None`.
    pub reference_hour: Option<u32>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl DashboardState {
    pub fn new(engine: PricingEngine, reference_hour: Option<u32>) -> Self {
        Self {
            engine: RwLock::new(engine),
            reference_hour,
            started_at: chrono::Utc::now(),
        }
    }

    /// Hour for a request: the explicit query value, else the reference hour.
    fn hour(&self, requested: Option<u32>) -> Result<u32, GasPricingError> {
        match requested {
            Some(hour) if hour < 24 => Ok(hour),
            Some(hour) => Err(GasPricingError::InvalidHour(hour)),
            None => Ok(resolve_hour(self.reference_hour)),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Maps boundary errors to a 400 with a JSON body.
#[derive(Debug)]
pub struct ApiError(pub GasPricingError);

impl From<GasPricingError> for ApiError {
    fn from(err: GasPricingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourQuery {
    pub hour: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateQuery {
    pub gas_used: u64,
    pub hour: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchQuery {
    pub tx_count: u64,
}

/// Telemetry for one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    pub tps: u64,
    pub utilization: f64,
    pub validators: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasRateResponse {
    pub native_currency: String,
    pub decimals: u8,
    pub current_gas_price: f64,
    /// `current_gas_price` in the smallest unit (price * 10^decimals).
    pub gas_price_wei: String,
    pub base_fee: f64,
    pub min_gas_price: f64,
    pub max_gas_price: f64,
    pub current_block: u64,
    pub hour_utc: u32,
    pub congestion_weight: f64,
    /// Congestion weight for each UTC hour, index 0 = midnight.
    pub hour_weights: Vec<f64>,
    pub history_len: usize,
    pub history_capacity: usize,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub gas_used: u64,
    pub gas_price: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDiscountResponse {
    pub tx_count: u64,
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalibrateResponse {
    pub adjusted: bool,
    pub base_fee: f64,
    pub adjustment: Option<BaseFeeAdjustment>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/gas/rate
pub async fn get_gas_rate(
    State(state): State<AppState>,
    Query(q): Query<HourQuery>,
) -> Result<Json<GasRateResponse>, ApiError> {
    let hour = state.hour(q.hour)?;
    let engine = state.engine.read().await;
    let economics = engine.economics();
    let gas_price = engine.gas_price(hour);
    let weights = engine.time_weights();

    Ok(Json(GasRateResponse {
        native_currency: "ZSNAIL".into(),
        decimals: economics.decimals,
        current_gas_price: gas_price,
        gas_price_wei: to_wei(gas_price, economics.decimals),
        base_fee: engine.base_fee(),
        min_gas_price: economics.min_gas_price,
        max_gas_price: economics.max_gas_price,
        current_block: engine.network_state().current_block,
        hour_utc: hour,
        congestion_weight: weights.weight(hour),
        hour_weights: weights.as_slice().to_vec(),
        history_len: engine.history().len(),
        history_capacity: engine.history().capacity(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    }))
}

/// GET /api/components
pub async fn get_components(
    State(state): State<AppState>,
    Query(q): Query<HourQuery>,
) -> Result<Json<PricingComponents>, ApiError> {
    let hour = state.hour(q.hour)?;
    let engine = state.engine.read().await;
    Ok(Json(engine.pricing_components(hour)))
}

/// GET /api/analysis
pub async fn get_analysis(
    State(state): State<AppState>,
    Query(q): Query<HourQuery>,
) -> Result<Json<CompetitiveAnalysis>, ApiError> {
    let hour = state.hour(q.hour)?;
    let engine = state.engine.read().await;
    Ok(Json(engine.competitive_analysis(hour)))
}

/// GET /api/history
pub async fn get_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<HistorySample>> {
    let engine = state.engine.read().await;
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(engine.history().recent_samples(limit))
}

/// GET /api/estimate
pub async fn get_estimate(
    State(state): State<AppState>,
    Query(q): Query<EstimateQuery>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let hour = state.hour(q.hour)?;
    let engine = state.engine.read().await;
    Ok(Json(EstimateResponse {
        gas_used: q.gas_used,
        gas_price: engine.gas_price(hour),
        cost: engine.estimate_transaction_cost(q.gas_used, hour),
    }))
}

/// GET /api/batch-discount
pub async fn get_batch_discount(
    State(state): State<AppState>,
    Query(q): Query<BatchQuery>,
) -> Json<BatchDiscountResponse> {
    let engine = state.engine.read().await;
    Json(BatchDiscountResponse {
        tx_count: q.tx_count,
        factor: engine.batch_discount(q.tx_count),
    })
}

/// POST /api/network-state
pub async fn post_network_state(
    State(state): State<AppState>,
    Query(q): Query<HourQuery>,
    Json(update): Json<TelemetryUpdate>,
) -> Result<Json<PricingComponents>, ApiError> {
    let hour = state.hour(q.hour)?;
    let mut engine = state.engine.write().await;
    engine.update_network_state(update.tps, update.utilization, update.validators, hour);
    Ok(Json(engine.pricing_components(hour)))
}

/// POST /api/base-fee/recalibrate
pub async fn post_recalibrate(State(state): State<AppState>) -> Json<RecalibrateResponse> {
    let mut engine = state.engine.write().await;
    let adjustment = engine.update_base_fee();
    Json(RecalibrateResponse {
        adjusted: adjustment.is_some(),
        base_fee: engine.base_fee(),
        adjustment,
    })
}

/// POST /api/simulate
pub async fn post_simulate(
    State(state): State<AppState>,
    Query(q): Query<HourQuery>,
    Json(scenarios): Json<Vec<Scenario>>,
) -> Result<Json<Vec<ScenarioResult>>, ApiError> {
    let hour = state.hour(q.hour)?;
    if scenarios.len() > MAX_SCENARIOS_PER_REQUEST {
        return Err(GasPricingError::InvalidScenario(format!(
            "{} scenarios requested, at most {MAX_SCENARIOS_PER_REQUEST} allowed",
            scenarios.len()
        ))
        .into());
    }
    let engine = state.engine.read().await;
    Ok(Json(engine.simulate_network_conditions(&scenarios, hour)))
}

/// Scale a token amount to its smallest unit, rounded to an integer string.
fn to_wei(amount: f64, decimals: u8) -> String {
    format!("{:.0}", amount * 10f64.powi(i32::from(decimals)))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
