//! # Weight Module
//!
//! Provides the `Weight` type used for device contributions and plan totals.
//!
//! ## Why Fixed-Point Weight?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    3 × 0.1 = 0.30000000000000004                                        │
//! │    round(1.995, 2) = 1.99   (1.995 is stored as 1.99499999...)          │
//! │                                                                         │
//! │  A total landing one hundredth off can flip Bronze into Ouro.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Hundredths                                       │
//! │    0.8 = 80, 0.5 = 50, 0.4 = 40, 0.6 = 60, 0.1 = 10                     │
//! │    3 × 10 = 30  (exactly 0.30)                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Every per-unit weight has at most two decimals and counts are integers, so
//! contributions, their sum and the gamer doubling are exact in hundredths and
//! never need rounding. Values that enter from outside as reals
//! ([`Weight::from_f64`], [`str::parse`]) are rounded to two decimals with
//! **round half to even** on their shortest decimal representation, so
//! `1.995` becomes `2.00` and `1.985` becomes `1.98`.
//!
//! ## Usage
//! ```rust
//! use micks_core::weight::Weight;
//!
//! let cell = Weight::from_hundredths(80); // 0.80
//! let total = cell.times(3);              // 2.40
//! assert_eq!(total.to_string(), "2.40");
//! assert_eq!(total.doubled().hundredths(), 480);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Weight Type
// =============================================================================

/// A non-negative weight with two decimal places, stored in hundredths.
///
/// ## Design Decisions
/// - **i64 hundredths**: exact arithmetic, same approach as integer money
/// - **Serialized as a JSON number**: `2.4` on the wire, `240` in memory and in
///   the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Weight(i64);

impl Weight {
    /// Creates a weight from hundredths.
    ///
    /// ```rust
    /// use micks_core::weight::Weight;
    ///
    /// assert_eq!(Weight::from_hundredths(160).to_string(), "1.60");
    /// ```
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Weight(hundredths)
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Zero weight.
    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    /// Checks if the weight is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a per-unit weight by a device count.
    ///
    /// Exact: `u32::MAX × 80` still fits comfortably in an i64.
    #[inline]
    pub const fn times(&self, count: u32) -> Self {
        Weight(self.0 * count as i64)
    }

    /// Doubles the weight (gamer profile).
    #[inline]
    pub const fn doubled(&self) -> Self {
        Weight(self.0 * 2)
    }

    /// Returns the weight as a real number (for display and classification).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a real number into a weight, rounding half to even at two
    /// decimals.
    ///
    /// Returns `None` for negative, NaN or infinite input, and for values
    /// too large to represent.
    ///
    /// ```rust
    /// use micks_core::weight::Weight;
    ///
    /// assert_eq!(Weight::from_f64(2.4).unwrap().hundredths(), 240);
    /// assert_eq!(Weight::from_f64(1.995).unwrap().hundredths(), 200);
    /// assert_eq!(Weight::from_f64(1.985).unwrap().hundredths(), 198);
    /// assert!(Weight::from_f64(-0.5).is_none());
    /// ```
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        if value == 0.0 {
            // Also covers -0.0, which would otherwise print with a sign
            return Some(Weight::zero());
        }

        // f64's Display is the shortest representation that round-trips and
        // never uses exponent notation, so it carries the decimal digits the
        // caller meant.
        value.to_string().parse().ok()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a plain decimal (`"2"`, `"2.4"`, `"1.995"`), rounding half to even
/// at two decimals.
impl FromStr for Weight {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidWeight(s.to_string());
        let s = s.trim();

        let (int_part, frac_part) = match s.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let whole: i64 = int_part.parse().map_err(|_| invalid())?;

        let frac = frac_part.as_bytes();
        let digit = |i: usize| frac.get(i).map_or(0, |b| i64::from(b - b'0'));
        let mut hundredths = whole
            .checked_mul(100)
            .and_then(|h| h.checked_add(digit(0) * 10 + digit(1)))
            .ok_or_else(invalid)?;

        // Round half to even on the third decimal, with everything after it as
        // the sticky part.
        let third = digit(2);
        let sticky = frac.iter().skip(3).any(|&b| b != b'0');
        let round_up = third > 5 || (third == 5 && (sticky || hundredths % 2 == 1));
        if round_up {
            hundredths = hundredths.checked_add(1).ok_or_else(invalid)?;
        }

        Ok(Weight(hundredths))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always shows two decimals: `2.40`, `0.08`.
impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), Add::add)
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Weight::from_f64(value).ok_or_else(|| {
            serde::de::Error::custom(CoreError::InvalidWeight(value.to_string()))
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
