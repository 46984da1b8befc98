//! Plan preview for the intake form.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use micks_core::{InventoryInput, PlanResult};

use crate::error::ApiResult;
use crate::AppState;

/// `POST /api/calculate`: inventory in, plan out. Nothing is stored.
pub async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<InventoryInput>, JsonRejection>,
) -> ApiResult<Json<PlanResult>> {
    let Json(input) = payload?;
    Ok(Json(state.sales.preview(&input)?))
}
