//! # Money Module
//!
//! Provides the `Money` and `Percentage` types for handling monetary values
//! and basis-point rates safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a loyalty ledger the drift compounds silently: a discount that is   │
//! │  off by one unit per invoice never reconciles against the debt ledger. │
//! │                                                                         │
//! │  OUR SOLUTION: integers in the smallest currency unit, everywhere.      │
//! │  Rounding happens in exactly two places (percentage application and     │
//! │  reversal proration) and both are explicit about direction.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meridian_core::money::{Money, Percentage};
//!
//! let subtotal = Money::from_cents(200_000);
//! let rate = Percentage::from_bps(500); // 5%
//!
//! assert_eq!(rate.of(subtotal).cents(), 10_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediates for refunds and deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// EVERY monetary value in the engine flows through this type: tier
/// thresholds, invoice subtotals, discount amounts, debt balances,
/// redemption values, refunds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let price = Money::from_cents(50_000);
    /// assert_eq!(price.cents(), 50_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Subtraction that floors at zero.
    ///
    /// For balances that must never go negative (remaining debt, invoice
    /// totals after refunds).
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let total = Money::from_cents(100);
    /// assert_eq!(total.saturating_sub(Money::from_cents(150)).cents(), 0);
    /// ```
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(50_000);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 150_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Scales this amount by `numerator / denominator`, flooring the result.
    ///
    /// Used for reversal proration: returning `q` of `Q` units reverses
    /// `amount × q / Q`. Flooring guarantees a reversal never hands back
    /// more than was originally granted, which keeps cumulative partial
    /// returns within the original amount.
    ///
    /// A non-positive denominator yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// let accrued = Money::from_cents(100);
    /// assert_eq!(accrued.prorate(1, 3).cents(), 33); // floored, not 33.33
    /// ```
    pub fn prorate(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 || numerator <= 0 {
            return Money::zero();
        }
        // i128 to prevent overflow on large amounts
        let scaled = (self.0 as i128 * numerator as i128) / denominator as i128;
        Money::from_cents(scaled as i64)
    }
}

// =============================================================================
// Percentage Type
// =============================================================================

/// A rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5.00% (e.g., a tier discount)
///
/// Values above 10000 are legal and mean multipliers above 1.0× — tier
/// points multipliers use this (15000 bps = 1.5×).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a percent value (for convenience).
    pub fn from_percent(pct: f64) -> Self {
        Percentage((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percent value (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    /// The identity multiplier (10000 bps = 1.0×).
    #[inline]
    pub const fn one() -> Self {
        Percentage(10_000)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Applies this rate to an amount, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::{Money, Percentage};
    ///
    /// let subtotal = Money::from_cents(200_000);
    /// let discount = Percentage::from_bps(500); // 5%
    /// assert_eq!(discount.of(subtotal).cents(), 10_000);
    /// ```
    pub fn of(&self, amount: Money) -> Money {
        // i128 to prevent overflow on large amounts
        let cents = (amount.cents() as i128 * self.0 as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{:.2}%", self.percent())
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the raw amount in the smallest unit.
///
/// ## Note
/// This is for debugging and log output. Currency formatting and
/// localization belong to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(50_000);
        assert_eq!(money.cents(), 50_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(250);

        assert_eq!(a.saturating_sub(b).cents(), 0);
        assert_eq!(b.saturating_sub(a).cents(), 150);
    }

    #[test]
    fn test_percentage_application_rounds() {
        // 200000 × 5% = 10000 exactly
        let subtotal = Money::from_cents(200_000);
        assert_eq!(Percentage::from_bps(500).of(subtotal).cents(), 10_000);

        // 999 × 8.25% = 82.4175 → 82
        assert_eq!(
            Percentage::from_bps(825).of(Money::from_cents(999)).cents(),
            82
        );

        // 1000 × 8.25% = 82.5 → 83 (half rounds up)
        assert_eq!(
            Percentage::from_bps(825).of(Money::from_cents(1000)).cents(),
            83
        );
    }

    #[test]
    fn test_percentage_above_one() {
        // 1.5× multiplier applied to 1000 = 1500
        let mult = Percentage::from_bps(15_000);
        assert_eq!(mult.of(Money::from_cents(1000)).cents(), 1500);
    }

    #[test]
    fn test_prorate_floors() {
        let amount = Money::from_cents(100);

        assert_eq!(amount.prorate(1, 3).cents(), 33);
        assert_eq!(amount.prorate(2, 3).cents(), 66);
        assert_eq!(amount.prorate(3, 3).cents(), 100);

        // Flooring means the three partial reversals never exceed the whole
        assert!(33 + 33 + 33 < 100);
    }

    #[test]
    fn test_prorate_degenerate_inputs() {
        let amount = Money::from_cents(100);
        assert_eq!(amount.prorate(1, 0).cents(), 0);
        assert_eq!(amount.prorate(0, 3).cents(), 0);
        assert_eq!(amount.prorate(-1, 3).cents(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(50_000)), "50000");
        assert_eq!(format!("{}", Percentage::from_bps(500)), "5%");
        assert_eq!(format!("{}", Percentage::from_bps(825)), "8.25%");
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
