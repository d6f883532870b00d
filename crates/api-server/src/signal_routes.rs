use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use signal_core::{SignalError, TradingSignal};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct SignalsQuery {
    /// Only signals at or above this win probability.
    #[serde(default)]
    pub min_probability: Option<f64>,
}

#[derive(Serialize)]
pub struct SignalsResponse {
    pub signals: Vec<TradingSignal>,
    pub count: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/signals", get(list_signals))
        .route("/api/signals/:id", get(get_signal))
}

/// Signals from the last 24 hours, newest first.
async fn list_signals(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Json<ApiResponse<SignalsResponse>> {
    let now = Utc::now();
    let signals = match query.min_probability {
        Some(min) => state.store.signals_with_min_probability(min, now),
        None => state.store.active_signals(now),
    };
    Json(ApiResponse::ok(SignalsResponse {
        count: signals.len(),
        signals,
    }))
}

async fn get_signal(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<TradingSignal>>, AppError> {
    let signal = state
        .store
        .signal(id)
        .ok_or_else(|| SignalError::not_found(format!("signal {id}")))?;
    Ok(Json(ApiResponse::ok(signal)))
}
