//! # micks-core: Pure Business Logic for Micks Calculadora
//!
//! This crate is the **heart** of the plan calculator. It contains the plan
//! rules, the domain types and validation as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Micks Calculadora Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Intake form  /  Admin sales view                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    micks-api (axum)                             │   │
//! │  │    calculate, contract, admin list/edit/delete/export          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ micks-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   plan    │  │  weight   │  │   types   │  │ validation│  │   │
//! │  │   │  compute  │  │  Weight   │  │ SaleRecord│  │   rules   │  │   │
//! │  │   │ PlanTier  │  │ hundredths│  │ SaleQuery │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    micks-db (Database Layer)                    │   │
//! │  │              SaleStore, SQLite repository, migrations           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`plan`] - Device weights, band table and [`compute`]
//! - [`weight`] - Fixed-point weight in hundredths
//! - [`types`] - Domain types (SaleRecord, DeviceInventory, SaleQuery, etc.)
//! - [`validation`] - Business rule validation
//! - [`export`] - CSV projection of sale records
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use micks_core::{compute, DeviceInventory, PlanTier};
//!
//! let inventory = DeviceInventory {
//!     cellphones: 2,
//!     computers: 1,
//!     ..Default::default()
//! };
//!
//! // 2 × 0.8 + 1 × 0.5 = 2.10 → Ouro
//! let result = compute(&inventory);
//! assert_eq!(result.total_weight.to_string(), "2.10");
//! assert_eq!(result.plan, PlanTier::Ouro);
//! assert_eq!(result.speed_mbps, 500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod plan;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use plan::{compute, DeviceBreakdown, DeviceKind, PlanResult, PlanTier};
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest count accepted for a single device kind.
///
/// ## Business Reason
/// Catches typos (10000 instead of 10) on the intake form. Anything above a
/// few dozen already lands in Diamante.
pub const MAX_DEVICE_COUNT: u32 = 10_000;

/// Maximum customer name length, in characters.
pub const MAX_NAME_LEN: usize = 120;

/// Maximum e-mail length, in characters.
pub const MAX_EMAIL_LEN: usize = 255;

/// Maximum phone length, in characters.
pub const MAX_PHONE_LEN: usize = 20;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 8;
