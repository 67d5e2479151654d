//! HTTP handlers, grouped by resource

pub mod auth;
pub mod messages;

use axum::extract::State;
use axum::response::Json;

use crate::error::Error;
use crate::health::HealthReport;

use super::state::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.check().await)
}

pub async fn not_found() -> Error {
    Error::new(crate::error::ErrorCode::NotFound, "Route not found")
}
