use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use signal_core::{ActiveTrade, SignalError, TradeStatus, TradingSignal};

use crate::{ApiResponse, AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/trades", post(open_trade))
        .route("/api/trades/:user_id", get(user_trades))
        .route("/api/trades/:id/exit", post(exit_trade))
}

#[derive(Deserialize)]
pub struct OpenTradeRequest {
    pub signal_id: u64,
    pub user_id: String,
    pub entry_price: f64,
    pub quantity: u32,
}

async fn open_trade(
    State(state): State<AppState>,
    Json(request): Json<OpenTradeRequest>,
) -> Result<Json<ApiResponse<ActiveTrade>>, AppError> {
    let trade = state.store.open_trade(
        request.signal_id,
        &request.user_id,
        request.entry_price,
        request.quantity,
        Utc::now(),
    )?;
    Ok(Json(ApiResponse::ok(trade)))
}

#[derive(Serialize)]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: ActiveTrade,
    pub signal: Option<TradingSignal>,
}

async fn user_trades(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<Vec<TradeView>>> {
    let trades = state
        .store
        .user_trades(&user_id)
        .into_iter()
        .map(|(trade, signal)| TradeView { trade, signal })
        .collect();
    Json(ApiResponse::ok(trades))
}

#[derive(Deserialize)]
pub struct ExitTradeRequest {
    /// "EXITED" (default) or "STOPPED".
    #[serde(default)]
    pub status: Option<String>,
    /// Final fill price; realized P&L is computed from it.
    #[serde(default)]
    pub exit_price: Option<f64>,
}

async fn exit_trade(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ExitTradeRequest>,
) -> Result<Json<ApiResponse<ActiveTrade>>, AppError> {
    let status = match request.status.as_deref() {
        None | Some("EXITED") => TradeStatus::Exited,
        Some("STOPPED") => TradeStatus::Stopped,
        Some(other) => {
            return Err(SignalError::validation(format!("unknown exit status '{other}'")).into())
        }
    };
    let exit_price = request
        .exit_price
        .ok_or_else(|| SignalError::validation("exit_price is required"))?;
    let trade = state.store.exit_trade(id, status, exit_price)?;
    Ok(Json(ApiResponse::ok(trade)))
}
