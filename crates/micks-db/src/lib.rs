//! # micks-db: Database Layer for Micks Calculadora
//!
//! Persistence of contracted sales. SQLite through sqlx, behind the
//! [`SaleStore`] trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Micks Data Flow                                  │
//! │                                                                         │
//! │  POST /api/contract  ·  /api/admin/sales                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     micks-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   SaleStore   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (store.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │       ▲       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepository│    │ 001_create_  │  │   │
//! │  │   │ WAL, FKs      │    │               │    │   sales.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ./data/micks.db                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`store`] - The [`SaleStore`] contract
//! - [`repository`] - SQLite implementation
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use micks_core::{CustomerInfo, DeviceInventory, NewSale, SaleQuery};
//! use micks_db::{Database, DbConfig, SaleStore};
//!
//! let db = Database::new(DbConfig::new("./data/micks.db")).await?;
//! let sale = db.sales().create(NewSale::contract(customer, inventory)).await?;
//! let newest_first = db.sales().list(&SaleQuery::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::sale::SaleRepository;
pub use store::SaleStore;
