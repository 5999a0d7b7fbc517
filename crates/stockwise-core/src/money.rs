//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Average cost of 15 units:                                              │
//! │    (10 × 100.00 + 5 × 130.00) / 15 = 110.00                             │
//! │    (15 × 143.33 + 3 × 99.99) / 18 = 136.10666...                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + explicit half-up division               │
//! │    (15 × 14333 + 3 × 9999) / 18 = 13610.67 → 13611 cents               │
//! │    Rounding happens once, at a single well-defined place.              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockwise_core::money::Money;
//!
//! let unit_price = Money::from_cents(20_000); // $200.00
//! let subtotal = unit_price.multiply_quantity(5);
//! assert_eq!(subtotal.cents(), 100_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: gross profit can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.average_cost_cents ──► SalesOrderItem.unit_cost (at shipment) │
/// │                                        │                                │
/// │  SalesOrderItem.subtotal ──► SalesOrder.total_amount                    │
/// │                                        │                                │
/// │                  total_amount - total_cost = gross_profit              │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let price = Money::from_cents(14333); // Represents $143.33
    /// assert_eq!(price.cents(), 14333);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(14333);
    /// assert_eq!(unit_cost.multiply_quantity(5).cents(), 71665);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_cents(1000)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Weighted average unit cost after receiving stock.
    ///
    /// ```text
    /// new_avg = (old_stock × old_avg + received × unit_cost)
    ///           ─────────────────────────────────────────────
    ///                     old_stock + received
    /// ```
    ///
    /// Rounded half-up to the nearest cent. When the denominator is zero
    /// (or negative, which only happens with corrupt input) the incoming
    /// `unit_cost` is returned unchanged.
    ///
    /// ## Example
    /// ```rust
    /// use stockwise_core::money::Money;
    ///
    /// let avg = Money::weighted_average(0, Money::zero(), 12, Money::from_cents(4550));
    /// assert_eq!(avg.cents(), 4550);
    /// ```
    pub fn weighted_average(old_stock: i64, old_avg: Money, received: i64, unit_cost: Money) -> Money {
        let denominator = old_stock as i128 + received as i128;
        if denominator <= 0 {
            return unit_cost;
        }

        // i128 keeps stock × cents products from overflowing
        let numerator = old_stock as i128 * old_avg.0 as i128 + received as i128 * unit_cost.0 as i128;
        Money(div_round_half_up(numerator, denominator) as i64)
    }
}

/// Integer division rounding half away from zero.
///
/// ## Example
/// ```rust
/// use stockwise_core::money::div_round_half_up;
///
/// assert_eq!(div_round_half_up(5, 2), 3);
/// assert_eq!(div_round_half_up(-5, 2), -3);
/// assert_eq!(div_round_half_up(4, 3), 1);
/// ```
pub fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and the CLI. Presentation layers format with their own
/// currency settings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(14333);
        assert_eq!(money.cents(), 14333);
        assert_eq!(money.dollars(), 143);
        assert_eq!(money.cents_part(), 33);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(71665)), "$716.65");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_weighted_average_receiving() {
        // 10 @ 100.00 + 5 @ 130.00 → 1650.00 / 15 = 110.00
        let avg = Money::weighted_average(10, Money::from_cents(10_000), 5, Money::from_cents(13_000));
        assert_eq!(avg.cents(), 11_000);
    }

    #[test]
    fn test_weighted_average_rounds_half_up() {
        // (1 × 0.01 + 1 × 0.02) / 2 = 0.015 → 0.02
        let avg = Money::weighted_average(1, Money::from_cents(1), 1, Money::from_cents(2));
        assert_eq!(avg.cents(), 2);

        // (2 × 0.00 + 1 × 0.01) / 3 = 0.0033 → 0.00
        let avg = Money::weighted_average(2, Money::zero(), 1, Money::from_cents(1));
        assert_eq!(avg.cents(), 0);
    }

    #[test]
    fn test_weighted_average_zero_denominator() {
        let avg = Money::weighted_average(0, Money::from_cents(999), 0, Money::from_cents(4550));
        assert_eq!(avg.cents(), 4550);
    }

    #[test]
    fn test_div_round_half_up() {
        assert_eq!(div_round_half_up(7, 2), 4);
        assert_eq!(div_round_half_up(6, 4), 2);
        assert_eq!(div_round_half_up(5, 4), 1);
        assert_eq!(div_round_half_up(-7, 2), -4);
        assert_eq!(div_round_half_up(0, 9), 0);
    }

    proptest! {
        /// The average always lies between the two input costs.
        #[test]
        fn weighted_average_is_bounded(
            old_stock in 0i64..100_000,
            old_avg in 0i64..10_000_000,
            received in 1i64..100_000,
            unit_cost in 0i64..10_000_000,
        ) {
            let avg = Money::weighted_average(
                old_stock,
                Money::from_cents(old_avg),
                received,
                Money::from_cents(unit_cost),
            );
            let lo = old_avg.min(unit_cost);
            let hi = old_avg.max(unit_cost);
            prop_assert!(avg.cents() >= lo && avg.cents() <= hi);
        }

        /// Receiving into empty stock takes the incoming cost as-is.
        #[test]
        fn empty_stock_takes_unit_cost(
            old_avg in 0i64..10_000_000,
            received in 1i64..100_000,
            unit_cost in 0i64..10_000_000,
        ) {
            let avg = Money::weighted_average(0, Money::from_cents(old_avg), received, Money::from_cents(unit_cost));
            prop_assert_eq!(avg.cents(), unit_cost);
        }
    }
}
