//! # Plan Calculator
//!
//! Turns a customer's device inventory into a plan recommendation.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        compute(inventory)                               │
//! │                                                                         │
//! │  DeviceInventory { cellphones: 2, computers: 1, gamer: true, .. }       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. count × unit weight per kind     cellphones 2 × 0.80 = 1.60         │
//! │                                      computers  1 × 0.50 = 0.50         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. sum contributions                subtotal = 2.10                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. gamer? × 2                       total_weight = 4.20                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. first band containing total      Diamante / 800 Mbps                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Band Table
//! ```text
//!   weight:  0 ─────── 1.0 ─────────── 2.0 ─────────── 3.0 ──────────▶
//!            [ Prata  )[    Bronze     ](     Ouro     )[  Diamante
//!              100 Mb       300 Mb          500 Mb          800 Mb
//! ```
//! 2.0 belongs to Bronze. The bands are evaluated in order and the first match
//! wins; they are disjoint and cover every real number.
//!
//! The weights and thresholds live only in this module. Every path that
//! creates or edits a sale goes through [`compute`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use ts_rs::TS;

use crate::types::DeviceInventory;
use crate::weight::Weight;

// =============================================================================
// Device Kinds
// =============================================================================

/// A kind of connected device declared on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Cellphones,
    Computers,
    SmartTvs,
    TvBoxes,
    Others,
}

impl DeviceKind {
    /// All device kinds, in form order.
    pub const ALL: [DeviceKind; 5] = [
        DeviceKind::Cellphones,
        DeviceKind::Computers,
        DeviceKind::SmartTvs,
        DeviceKind::TvBoxes,
        DeviceKind::Others,
    ];

    /// Per-unit weight of this device kind.
    #[inline]
    pub const fn unit_weight(&self) -> Weight {
        match self {
            DeviceKind::Cellphones => Weight::from_hundredths(80),
            DeviceKind::Computers => Weight::from_hundredths(50),
            DeviceKind::SmartTvs => Weight::from_hundredths(40),
            DeviceKind::TvBoxes => Weight::from_hundredths(60),
            DeviceKind::Others => Weight::from_hundredths(10),
        }
    }

    /// Field name used in payloads, columns and validation messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Cellphones => "cellphones",
            DeviceKind::Computers => "computers",
            DeviceKind::SmartTvs => "smart_tvs",
            DeviceKind::TvBoxes => "tv_boxes",
            DeviceKind::Others => "others",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Per-Kind Breakdown
// =============================================================================

/// Weighted contribution of each device kind, two decimals each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeviceBreakdown {
    #[ts(type = "number")]
    pub cellphones: Weight,
    #[ts(type = "number")]
    pub computers: Weight,
    #[ts(type = "number")]
    pub smart_tvs: Weight,
    #[ts(type = "number")]
    pub tv_boxes: Weight,
    #[ts(type = "number")]
    pub others: Weight,
}

impl DeviceBreakdown {
    /// Builds a breakdown by evaluating `f` for every device kind.
    pub fn from_fn(mut f: impl FnMut(DeviceKind) -> Weight) -> Self {
        DeviceBreakdown {
            cellphones: f(DeviceKind::Cellphones),
            computers: f(DeviceKind::Computers),
            smart_tvs: f(DeviceKind::SmartTvs),
            tv_boxes: f(DeviceKind::TvBoxes),
            others: f(DeviceKind::Others),
        }
    }

    /// Returns the contribution of one device kind.
    pub const fn get(&self, kind: DeviceKind) -> Weight {
        match kind {
            DeviceKind::Cellphones => self.cellphones,
            DeviceKind::Computers => self.computers,
            DeviceKind::SmartTvs => self.smart_tvs,
            DeviceKind::TvBoxes => self.tv_boxes,
            DeviceKind::Others => self.others,
        }
    }

    /// Iterates `(kind, contribution)` pairs in form order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceKind, Weight)> + '_ {
        DeviceKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Sum of all contributions.
    pub fn subtotal(&self) -> Weight {
        self.iter().map(|(_, weight)| weight).sum()
    }
}

// =============================================================================
// Plan Tiers
// =============================================================================

/// One of the four fixed service levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PlanTier {
    Prata,
    Bronze,
    Ouro,
    Diamante,
}

impl PlanTier {
    /// All tiers, lowest first.
    pub const ALL: [PlanTier; 4] = [
        PlanTier::Prata,
        PlanTier::Bronze,
        PlanTier::Ouro,
        PlanTier::Diamante,
    ];

    /// Bandwidth of the tier in Mbps.
    #[inline]
    pub const fn speed_mbps(&self) -> u32 {
        match self {
            PlanTier::Prata => 100,
            PlanTier::Bronze => 300,
            PlanTier::Ouro => 500,
            PlanTier::Diamante => 800,
        }
    }

    /// Display name of the tier.
    pub const fn name(&self) -> &'static str {
        match self {
            PlanTier::Prata => "Prata",
            PlanTier::Bronze => "Bronze",
            PlanTier::Ouro => "Ouro",
            PlanTier::Diamante => "Diamante",
        }
    }

    /// Classifies any real total through [`PLAN_BANDS`].
    ///
    /// NaN is not contained in any band and falls back to Prata.
    ///
    /// ```rust
    /// use micks_core::plan::PlanTier;
    ///
    /// assert_eq!(PlanTier::classify(2.0), PlanTier::Bronze);
    /// assert_eq!(PlanTier::classify(2.00001), PlanTier::Ouro);
    /// ```
    pub fn classify(total_weight: f64) -> PlanTier {
        PLAN_BANDS
            .iter()
            .find(|band| band.contains(total_weight))
            .map_or(PlanTier::Prata, |band| band.tier)
    }

    /// Classifies a computed total weight.
    pub fn for_weight(total_weight: Weight) -> PlanTier {
        PlanTier::classify(total_weight.as_f64())
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A half-open, closed or unbounded range of total weights mapped to a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanBand {
    pub tier: PlanTier,
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl PlanBand {
    /// Checks whether a total weight falls inside this band.
    pub fn contains(&self, value: f64) -> bool {
        let above_lower = match self.lower {
            Bound::Included(lo) => value >= lo,
            Bound::Excluded(lo) => value > lo,
            Bound::Unbounded => !value.is_nan(),
        };
        let below_upper = match self.upper {
            Bound::Included(hi) => value <= hi,
            Bound::Excluded(hi) => value < hi,
            Bound::Unbounded => !value.is_nan(),
        };
        above_lower && below_upper
    }
}

/// Ordered, disjoint band table. First match wins.
pub const PLAN_BANDS: [PlanBand; 4] = [
    PlanBand {
        tier: PlanTier::Prata,
        lower: Bound::Unbounded,
        upper: Bound::Excluded(1.0),
    },
    PlanBand {
        tier: PlanTier::Bronze,
        lower: Bound::Included(1.0),
        upper: Bound::Included(2.0),
    },
    PlanBand {
        tier: PlanTier::Ouro,
        lower: Bound::Excluded(2.0),
        upper: Bound::Excluded(3.0),
    },
    PlanBand {
        tier: PlanTier::Diamante,
        lower: Bound::Included(3.0),
        upper: Bound::Unbounded,
    },
];

// =============================================================================
// Plan Result
// =============================================================================

/// Outcome of a calculation. Stored verbatim on a sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanResult {
    /// Per-kind weighted contribution, two decimals each.
    pub contributions: DeviceBreakdown,
    /// Sum of contributions, doubled for gamers.
    #[ts(type = "number")]
    pub total_weight: Weight,
    pub plan: PlanTier,
    pub speed_mbps: u32,
}

/// Computes the plan for a device inventory.
///
/// Pure and total: no I/O, no failure mode. Arithmetic is exact in
/// hundredths, so the per-kind rounding and the final rounding are both
/// no-ops under round-half-to-even (see [`crate::weight`]).
///
/// ```rust
/// use micks_core::{compute, DeviceInventory, PlanTier};
///
/// let inventory = DeviceInventory { cellphones: 1, ..Default::default() };
/// let result = compute(&inventory);
/// assert_eq!(result.total_weight.to_string(), "0.80");
/// assert_eq!(result.plan, PlanTier::Prata);
///
/// let gamer = DeviceInventory { gamer: true, ..inventory };
/// assert_eq!(compute(&gamer).plan, PlanTier::Bronze);
/// ```
pub fn compute(inventory: &DeviceInventory) -> PlanResult {
    let contributions =
        DeviceBreakdown::from_fn(|kind| kind.unit_weight().times(inventory.count(kind)));

    let subtotal = contributions.subtotal();
    let total_weight = if inventory.gamer {
        subtotal.doubled()
    } else {
        subtotal
    };

    let plan = PlanTier::for_weight(total_weight);

    PlanResult {
        contributions,
        total_weight,
        plan,
        speed_mbps: plan.speed_mbps(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inventory(counts: [u32; 5], gamer: bool) -> DeviceInventory {
        DeviceInventory {
            cellphones: counts[0],
            computers: counts[1],
            smart_tvs: counts[2],
            tv_boxes: counts[3],
            others: counts[4],
            gamer,
        }
    }

    #[test]
    fn test_boundaries() {
        let cases = [
            (0.0, PlanTier::Prata, 100),
            (0.99999, PlanTier::Prata, 100),
            (1.0, PlanTier::Bronze, 300),
            (2.0, PlanTier::Bronze, 300),
            (2.00001, PlanTier::Ouro, 500),
            (2.99999, PlanTier::Ouro, 500),
            (3.0, PlanTier::Diamante, 800),
            (1000.0, PlanTier::Diamante, 800),
        ];

        for (total, tier, speed) in cases {
            let classified = PlanTier::classify(total);
            assert_eq!(classified, tier, "total {total}");
            assert_eq!(classified.speed_mbps(), speed, "total {total}");
        }
    }

    #[test]
    fn test_nan_falls_back_to_prata() {
        assert_eq!(PlanTier::classify(f64::NAN), PlanTier::Prata);
        assert!(PLAN_BANDS.iter().all(|band| !band.contains(f64::NAN)));
    }

    #[test]
    fn test_gamer_doubling() {
        let casual = compute(&inventory([1, 0, 0, 0, 0], false));
        assert_eq!(casual.total_weight.hundredths(), 80);
        assert_eq!(casual.plan, PlanTier::Prata);
        assert_eq!(casual.speed_mbps, 100);

        let gamer = compute(&inventory([1, 0, 0, 0, 0], true));
        assert_eq!(gamer.total_weight.hundredths(), 160);
        assert_eq!(gamer.plan, PlanTier::Bronze);
        assert_eq!(gamer.speed_mbps, 300);
    }

    #[test]
    fn test_per_kind_contributions() {
        let result = compute(&inventory([2, 3, 1, 4, 7], false));

        assert_eq!(result.contributions.cellphones.to_string(), "1.60");
        assert_eq!(result.contributions.computers.to_string(), "1.50");
        assert_eq!(result.contributions.smart_tvs.to_string(), "0.40");
        assert_eq!(result.contributions.tv_boxes.to_string(), "2.40");
        assert_eq!(result.contributions.others.to_string(), "0.70");
        assert_eq!(result.total_weight.to_string(), "6.60");
        assert_eq!(result.plan, PlanTier::Diamante);
    }

    #[test]
    fn test_exact_two_lands_in_bronze() {
        // 5 × 0.4 = 2.00 exactly
        let result = compute(&inventory([0, 0, 5, 0, 0], false));
        assert_eq!(result.total_weight.hundredths(), 200);
        assert_eq!(result.plan, PlanTier::Bronze);

        // 0.1 × 21 = 2.10 → Ouro
        let result = compute(&inventory([0, 0, 0, 0, 21], false));
        assert_eq!(result.total_weight.hundredths(), 210);
        assert_eq!(result.plan, PlanTier::Ouro);

        // 0.1 × 10 = 1.00 exactly, not 0.9999999
        let result = compute(&inventory([0, 0, 0, 0, 10], false));
        assert_eq!(result.plan, PlanTier::Bronze);
    }

    #[test]
    fn test_empty_inventory() {
        let result = compute(&DeviceInventory::default());
        assert!(result.total_weight.is_zero());
        assert_eq!(result.plan, PlanTier::Prata);

        let gamer = compute(&inventory([0; 5], true));
        assert!(gamer.total_weight.is_zero());
        assert_eq!(gamer.plan, PlanTier::Prata);
    }

    #[test]
    fn test_band_table_is_ordered() {
        let tiers: Vec<PlanTier> = PLAN_BANDS.iter().map(|band| band.tier).collect();
        assert_eq!(tiers, PlanTier::ALL.to_vec());
    }

    proptest! {
        #[test]
        fn prop_every_total_lands_in_exactly_one_band(total in proptest::num::f64::ANY) {
            prop_assume!(!total.is_nan());
            let matching = PLAN_BANDS.iter().filter(|band| band.contains(total)).count();
            prop_assert_eq!(matching, 1);
        }

        #[test]
        fn prop_hundredths_land_in_exactly_one_band(hundredths in 0i64..100_000) {
            let total = Weight::from_hundredths(hundredths).as_f64();
            let matching: Vec<PlanTier> = PLAN_BANDS
                .iter()
                .filter(|band| band.contains(total))
                .map(|band| band.tier)
                .collect();
            prop_assert_eq!(matching.len(), 1);
            prop_assert_eq!(matching[0], PlanTier::classify(total));
        }

        #[test]
        fn prop_compute_is_deterministic(
            counts in proptest::array::uniform5(0u32..10_000),
            gamer in any::<bool>(),
        ) {
            let inv = inventory(counts, gamer);
            prop_assert_eq!(compute(&inv), compute(&inv));
        }

        #[test]
        fn prop_total_is_sum_of_contributions(
            counts in proptest::array::uniform5(0u32..10_000),
            gamer in any::<bool>(),
        ) {
            let result = compute(&inventory(counts, gamer));
            let factor = if gamer { 2 } else { 1 };
            prop_assert_eq!(
                result.total_weight.hundredths(),
                result.contributions.subtotal().hundredths() * factor
            );
            prop_assert_eq!(result.speed_mbps, result.plan.speed_mbps());
        }
    }
}
