//! # Domain Types
//!
//! Core domain types used throughout Micks Calculadora.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DeviceInventory │──►│   PlanResult    │   │  CustomerInfo   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  5 counts (u32) │   │  contributions  │   │  name           │       │
//! │  │  gamer          │   │  total_weight   │   │  email          │       │
//! │  └────────┬────────┘   │  plan, speed    │   │  phone          │       │
//! │           │            └────────┬────────┘   └────────┬────────┘       │
//! │           └─────────────────────┼─────────────────────┘                │
//! │                                 ▼                                       │
//! │                        ┌─────────────────┐                              │
//! │                        │   SaleRecord    │  persisted contract          │
//! │                        │  id (UUID)      │                              │
//! │                        │  created_at     │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A sale keeps the inventory and the plan computed at contract time. Reads
//! never recompute; only an inventory edit replaces the stored plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::plan::{compute, DeviceKind, PlanResult};
use crate::validation::{self, ValidationResult};

// =============================================================================
// Device Inventory
// =============================================================================

/// Customer-declared device counts plus the gamer flag.
///
/// Counts are unsigned: a negative count cannot be represented here and is
/// rejected earlier, by [`InventoryInput::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeviceInventory {
    pub cellphones: u32,
    pub computers: u32,
    pub smart_tvs: u32,
    pub tv_boxes: u32,
    pub others: u32,
    pub gamer: bool,
}

impl DeviceInventory {
    /// Returns the count for one device kind.
    pub const fn count(&self, kind: DeviceKind) -> u32 {
        match kind {
            DeviceKind::Cellphones => self.cellphones,
            DeviceKind::Computers => self.computers,
            DeviceKind::SmartTvs => self.smart_tvs,
            DeviceKind::TvBoxes => self.tv_boxes,
            DeviceKind::Others => self.others,
        }
    }

    /// Total number of declared devices.
    pub fn total_devices(&self) -> u64 {
        DeviceKind::ALL
            .iter()
            .map(|&kind| u64::from(self.count(kind)))
            .sum()
    }
}

/// Raw inventory as it arrives at a boundary (signed, every field optional).
///
/// Kept signed so a negative count is reported as a validation failure
/// naming the field instead of a generic deserialization error. The `n_*`
/// aliases keep the first version of the intake form working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct InventoryInput {
    #[serde(alias = "n_cellphones")]
    pub cellphones: i64,
    #[serde(alias = "n_computers")]
    pub computers: i64,
    #[serde(alias = "n_smart_tvs")]
    pub smart_tvs: i64,
    #[serde(alias = "n_tv_box")]
    pub tv_boxes: i64,
    #[serde(alias = "n_others")]
    pub others: i64,
    pub gamer: bool,
}

impl InventoryInput {
    /// Validates every count and builds a [`DeviceInventory`].
    pub fn validate(&self) -> ValidationResult<DeviceInventory> {
        Ok(DeviceInventory {
            cellphones: validation::validate_device_count(DeviceKind::Cellphones, self.cellphones)?,
            computers: validation::validate_device_count(DeviceKind::Computers, self.computers)?,
            smart_tvs: validation::validate_device_count(DeviceKind::SmartTvs, self.smart_tvs)?,
            tv_boxes: validation::validate_device_count(DeviceKind::TvBoxes, self.tv_boxes)?,
            others: validation::validate_device_count(DeviceKind::Others, self.others)?,
            gamer: self.gamer,
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer contact fields captured on contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    /// Validates and trims every field.
    pub fn validate(&self) -> ValidationResult<CustomerInfo> {
        Ok(CustomerInfo {
            name: validation::validate_customer_name(&self.name)?,
            email: validation::validate_email(&self.email)?,
            phone: validation::validate_phone(&self.phone)?,
        })
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// A finalized contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    /// Unique identifier (UUID v4), immutable.
    pub id: String,

    pub customer: CustomerInfo,

    /// Inventory that produced the plan (frozen).
    pub inventory: DeviceInventory,

    /// Plan computed at contract time (frozen until an inventory edit).
    pub plan: PlanResult,

    /// When the contract was created. Server-assigned, immutable.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the record was last edited by an administrator.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Everything the store needs to create a sale record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub customer: CustomerInfo,
    pub inventory: DeviceInventory,
    pub plan: PlanResult,
}

impl NewSale {
    /// Builds a new sale, computing its plan from the inventory.
    pub fn contract(customer: CustomerInfo, inventory: DeviceInventory) -> Self {
        let plan = compute(&inventory);
        NewSale {
            customer,
            inventory,
            plan,
        }
    }
}

/// Administrative edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleUpdate {
    pub customer: Option<CustomerInfo>,
    pub inventory: Option<DeviceInventory>,
}

impl SaleUpdate {
    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.customer.is_none() && self.inventory.is_none()
    }
}

// =============================================================================
// Query
// =============================================================================

/// Column a sale listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Name,
}

impl SortKey {
    /// Direction used when the caller picks a key but no direction.
    pub const fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::CreatedAt => SortDirection::Desc,
            SortKey::Name => SortDirection::Asc,
        }
    }
}

/// Accepts the admin view's `date` / `name` as well as `created_at`.
impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" | "created_at" => Ok(SortKey::CreatedAt),
            "name" => Ok(SortKey::Name),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: vec!["date".to_string(), "name".to_string()],
            }),
        }
    }
}

/// Ascending or descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ValidationError::NotAllowed {
                field: "dir".to_string(),
                allowed: vec!["asc".to_string(), "desc".to_string()],
            }),
        }
    }
}

/// Sort order of a listing. Default: newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SaleSort {
    /// Sort by `key` in its default direction.
    pub const fn by(key: SortKey) -> Self {
        SaleSort {
            key,
            direction: key.default_direction(),
        }
    }

    /// Overrides the direction.
    pub const fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }
}

impl fmt::Display for SaleSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::CreatedAt => "date",
            SortKey::Name => "name",
        };
        write!(f, "{} {}", key, self.direction.as_sql())
    }
}

/// Listing filter and order for the admin view and the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleQuery {
    /// Case-insensitive substring of the customer name.
    pub name_contains: Option<String>,
    pub sort: SaleSort,
}

// =============================================================================
// Unit Tests
// =============================================================================
