//! # Repository Module
//!
//! SQLite implementations of the store traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  service.list(query)                                            │
//! │       ▼                                                                 │
//! │  SalesService ── Arc<dyn SaleStore> ──► SaleRepository                 │
//! │                                         ├── create(new_sale)           │
//! │                                         ├── list(query)                │
//! │                                         ├── get / update / delete(id)  │
//! │                                         └── find_by_email(email)       │
//! │                                              │                          │
//! │                                              │  SQL                     │
//! │                                              ▼                          │
//! │                                         SQLite `sales` table           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sale record CRUD and queries

pub mod sale;
