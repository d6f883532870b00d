use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use signal_core::{
    flash_message, rule_based_sentiment, ChainEntry, IndicatorBundle, MarketConditions,
    MarketSentiment, MarketSnapshot, NewsFlash, SessionState, TradingStrategy,
};

use crate::{ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/market-overview", get(market_overview))
        .route("/api/market-status", get(market_status))
        .route("/api/option-chain", get(option_chain))
        .route("/api/news", get(news))
        .route("/api/strategies", get(strategies))
}

#[derive(Serialize)]
pub struct MarketOverview {
    pub market_data: MarketSnapshot,
    pub indicators: Option<IndicatorBundle>,
    pub conditions: Option<MarketConditions>,
    pub sentiment: MarketSentiment,
    pub flash: String,
    pub session: SessionState,
    pub active_signals: usize,
    pub active_trades: usize,
    pub news: Vec<NewsFlash>,
}

/// Everything the dashboard landing view needs in one call.
async fn market_overview(State(state): State<AppState>) -> Json<ApiResponse<MarketOverview>> {
    let now = Utc::now();
    let session = state.clock.state_at(now);
    let market_data = state
        .store
        .snapshot()
        .unwrap_or_else(|| MarketSnapshot::fallback(session));
    let sentiment = state
        .store
        .sentiment()
        .unwrap_or_else(|| rule_based_sentiment(&market_data));
    let flash = flash_message(&sentiment, session);

    Json(ApiResponse::ok(MarketOverview {
        indicators: state.store.indicators(),
        conditions: state.store.conditions(),
        flash,
        session,
        active_signals: state.store.active_signals(now).len(),
        active_trades: state.store.active_trades().len(),
        news: state.store.recent_news(5),
        market_data,
        sentiment,
    }))
}

#[derive(Serialize)]
pub struct MarketStatus {
    pub session: SessionState,
    pub is_open: bool,
    pub local_time: String,
    pub next_expiry: String,
}

async fn market_status(State(state): State<AppState>) -> Json<ApiResponse<MarketStatus>> {
    let now = Utc::now();
    let session = state.clock.state_at(now);
    let today = state.clock.local_date_at(now);
    Json(ApiResponse::ok(MarketStatus {
        session,
        is_open: session.is_open(),
        local_time: now.to_rfc3339(),
        next_expiry: signal_core::next_expiry_thursday(today)
            .format("%d-%b-%Y")
            .to_string(),
    }))
}

async fn option_chain(State(state): State<AppState>) -> Json<ApiResponse<Vec<ChainEntry>>> {
    Json(ApiResponse::ok(state.store.chain()))
}

#[derive(Deserialize)]
pub struct NewsQuery {
    #[serde(default = "default_news_limit")]
    pub limit: usize,
}

fn default_news_limit() -> usize {
    10
}

async fn news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Json<ApiResponse<Vec<NewsFlash>>> {
    Json(ApiResponse::ok(state.store.recent_news(query.limit)))
}

/// Cached per-tick strategy set, recomputed on demand when the engine has
/// analysed at least one tick but no set is cached yet. Before the first
/// tick there is simply no data: an empty list, not an error.
async fn strategies(State(state): State<AppState>) -> Json<ApiResponse<Vec<TradingStrategy>>> {
    let cached = state.store.strategies();
    if !cached.is_empty() {
        return Json(ApiResponse::ok(cached));
    }
    let (Some(indicators), Some(conditions)) =
        (state.store.indicators(), state.store.conditions())
    else {
        return Json(ApiResponse::ok(Vec::new()));
    };
    let now = Utc::now();
    let recomputed = state.selector.select(
        &indicators,
        &conditions,
        state.clock.state_at(now),
        state.clock.in_closing_window_at(now),
    );
    Json(ApiResponse::ok(recomputed))
}
