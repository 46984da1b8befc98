//! Liveness and database probe.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// False when `SELECT 1` fails. The endpoint still answers 200.
    pub db_ok: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        db_ok: state.db.health_check().await,
    })
}
