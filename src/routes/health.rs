//! Health endpoints (/health, /health/:service)

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;
use crate::errors::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api_status))
        .route("/health/{service}", get(service_status))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

fn verdict(alive: bool) -> (StatusCode, Json<StatusResponse>) {
    if alive {
        (StatusCode::OK, Json(StatusResponse { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse { status: "error" }),
        )
    }
}

/// GET /health - Aggregate liveness across every probed resource
async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    verdict(state.liveness.all_alive().await)
}

/// GET /health/:service - Liveness of one named resource
async fn service_status(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(verdict(state.liveness.is_alive(&service).await?))
}
