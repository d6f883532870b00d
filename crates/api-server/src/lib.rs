use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use notifier::SubscriberRegistry;
use signal_core::{SessionClock, SignalError};
use signal_store::SignalStore;
use strategy_selector::StrategySelector;

pub mod broadcast;
pub mod market_routes;
pub mod signal_routes;
pub mod subscriber_routes;
pub mod trade_routes;
pub mod ws_routes;

pub use broadcast::{EventBus, WsEvent};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SignalStore>,
    pub clock: SessionClock,
    pub registry: Arc<SubscriberRegistry>,
    pub events: EventBus,
    pub selector: Arc<StrategySelector>,
}

/// Uniform JSON envelope for every REST response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP-facing wrapper over the pipeline's error taxonomy.
#[derive(Debug)]
pub struct AppError(pub SignalError);

impl From<SignalError> for AppError {
    fn from(err: SignalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SignalError::Validation(_) => StatusCode::BAD_REQUEST,
            SignalError::NotFound(_) => StatusCode::NOT_FOUND,
            SignalError::Fetch(_) | SignalError::Notification(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(ApiResponse::error(self.0.to_string()))).into_response()
    }
}

/// The full dashboard API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(market_routes::routes())
        .merge(signal_routes::routes())
        .merge(trade_routes::routes())
        .merge(subscriber_routes::routes())
        .merge(ws_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState {
        store: Arc::new(SignalStore::new()),
        clock: SessionClock::new(),
        registry: Arc::new(SubscriberRegistry::new(vec![])),
        events: EventBus::new(16),
        selector: Arc::new(StrategySelector::new()),
    }
}
