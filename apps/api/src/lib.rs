//! # Micks API
//!
//! HTTP server for the plan calculator and the sales records.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Micks API Routes                               │
//! │                                                                         │
//! │  public                               admin (Bearer token)              │
//! │  ┌──────────────────────────┐         ┌──────────────────────────────┐ │
//! │  │ GET  /health             │         │ GET    /api/admin/sales      │ │
//! │  │ POST /api/calculate      │         │ GET    /api/admin/sales/     │ │
//! │  │ POST /api/contract       │         │          export              │ │
//! │  │ POST /api/admin/login    │         │ GET    /api/admin/sales/{id} │ │
//! │  └────────────┬─────────────┘         │ PUT    /api/admin/sales/{id} │ │
//! │               │                       │ DELETE /api/admin/sales/{id} │ │
//! │               │                       └──────────────┬───────────────┘ │
//! │               ▼                                      ▼                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  SalesService ──► SaleStore (SQLite)     Notifier (SMTP / log)  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]; every field can be set as `MICKS_<FIELD>`.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod service;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use micks_db::Database;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::AdminAuth;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use service::SalesService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sales: Arc<SalesService>,
    pub auth: Arc<AdminAuth>,
    pub db: Database,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/admin/sales", get(routes::admin::list_sales))
        .route("/api/admin/sales/export", get(routes::admin::export_sales))
        .route(
            "/api/admin/sales/{id}",
            get(routes::admin::get_sale)
                .put(routes::admin::update_sale)
                .delete(routes::admin::delete_sale),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/calculate", post(routes::calculate::calculate))
        .route("/api/contract", post(routes::contract::contract))
        .route("/api/admin/login", post(routes::admin::login))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
