//! Admin routes: login plus the sales records.
//!
//! Everything except `login` runs behind [`crate::auth::require_admin`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use micks_core::SaleRecord;

use crate::auth::{LoginRequest, LoginResponse};
use crate::error::ApiResult;
use crate::service::{ListParams, SaleEdit};
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.auth.login(request).await?))
}

/// `GET /api/admin/sales?name=&sort=&dir=` or `?email=`.
pub async fn list_sales(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SaleRecord>>> {
    let Query(params) = params?;
    Ok(Json(state.sales.list(&params).await?))
}

/// `GET /api/admin/sales/export`: the listing as a CSV attachment.
pub async fn export_sales(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    let body = state.sales.export(&params).await?;

    let filename = format!("micks-vendas-{}.csv", Utc::now().format("%Y%m%d-%H%M%S"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleRecord>> {
    Ok(Json(state.sales.get(&id).await?))
}

pub async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SaleEdit>, JsonRejection>,
) -> ApiResult<Json<SaleRecord>> {
    let Json(edit) = payload?;
    Ok(Json(state.sales.update(&id, edit).await?))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.sales.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
