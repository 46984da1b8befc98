//! Contract submission.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use micks_core::SaleRecord;

use crate::error::ApiResult;
use crate::service::ContractRequest;
use crate::AppState;

/// `POST /api/contract`: stores the sale and answers 201 with the record.
pub async fn contract(
    State(state): State<AppState>,
    payload: Result<Json<ContractRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleRecord>)> {
    let Json(request) = payload?;
    let record = state.sales.contract(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
