use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use notifier::Subscriber;

use crate::{ApiResponse, AppError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/subscribers", post(subscribe).get(list))
        .route("/api/subscribers/:phone", delete(unsubscribe))
}

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub phone: String,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    state.registry.add(&request.phone)?;
    Ok(Json(ApiResponse::ok(state.registry.active())))
}

async fn unsubscribe(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    state.registry.deactivate(&phone)?;
    Ok(Json(ApiResponse::ok(state.registry.active())))
}

async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<Subscriber>>> {
    Json(ApiResponse::ok(state.registry.all()))
}
