//! # Sale Store
//!
//! The persistence contract for sale records.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesService (micks-api)                                               │
//! │       │  Arc<dyn SaleStore>                                             │
//! │       ▼                                                                 │
//! │  SaleStore ◄──── SaleRepository (SQLite, this crate)                   │
//! │            ◄──── test doubles                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations own the canonical copy of every record and hand out owned
//! snapshots. Each mutation is atomic. Authorization is the caller's concern.

use async_trait::async_trait;
use micks_core::{NewSale, SaleQuery, SaleRecord, SaleUpdate};

use crate::error::DbResult;

/// Storage of contracted sales.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persists a new sale. Assigns the id and `created_at`.
    async fn create(&self, sale: NewSale) -> DbResult<SaleRecord>;

    /// Returns the records matching `query`, in the requested order.
    ///
    /// The name filter is a substring match on the folded name (Unicode
    /// lowercase, Latin accents dropped); the name sort uses the same key.
    /// Equal sort keys fall back to newest first.
    async fn list(&self, query: &SaleQuery) -> DbResult<Vec<SaleRecord>>;

    /// Returns one record, or `NotFound`.
    async fn get(&self, id: &str) -> DbResult<SaleRecord>;

    /// Applies an administrative edit, or returns `NotFound`.
    ///
    /// A new inventory replaces the stored plan with a fresh calculation in
    /// the same transaction.
    async fn update(&self, id: &str, update: SaleUpdate) -> DbResult<SaleRecord>;

    /// Removes a record, or returns `NotFound`.
    async fn delete(&self, id: &str) -> DbResult<()>;

    /// All records of one customer e-mail (case-insensitive), newest first.
    async fn find_by_email(&self, email: &str) -> DbResult<Vec<SaleRecord>>;

    /// Number of stored records.
    async fn count(&self) -> DbResult<u64>;
}
