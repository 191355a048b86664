//! `GET /health`.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::state::AppState;
use cubicler_core::HealthReport;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.health.check().await)
}
