//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! half-up rounding rule shared by every monetary and stock calculation.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every price, subtotal, tax and discount is a whole number of cents. │
//! │    That is exactly a decimal with a fixed scale of 2.                  │
//! │                                                                         │
//! │  Quantities that are NOT money (2.5 kg of flour, a 12.5% discount)     │
//! │  use rust_decimal::Decimal and are rounded into cents with             │
//! │  round_half_up() when they turn into money.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cafe_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(450); // $4.50
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // $9.00
//! let total = price + Money::from_cents(50); // $5.00
//! assert_eq!(doubled.cents(), 900);
//! assert_eq!(total.cents(), 500);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::types::TaxRate;
use crate::validation::validate_percentage;

// =============================================================================
// Rounding
// =============================================================================

/// Rounds to `dp` decimal places, halves away from zero.
///
/// This is the single rounding rule of the system: tax, percentage discounts
/// and stock valuation all go through it.
///
/// ## Example
/// ```rust
/// use cafe_core::money::round_half_up;
/// use rust_decimal::Decimal;
///
/// let tax = Decimal::new(19995, 4); // 1.9995
/// assert_eq!(round_half_up(tax, 2), Decimal::new(200, 2));
/// ```
#[inline]
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Arithmetic stays total; domain rules keep stored
///   amounts non-negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price ──► OrderItem.unit_price (snapshot) ──► item subtotal   │
/// │                                                                         │
/// │  Σ item subtotals ──► Order.subtotal ──► tax (10%) ──► Order.total     │
/// │                                                                         │
/// │  Order.total ──► floor() ──► loyalty points earned                     │
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
    /// use cafe_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount into money, rounding half-up to cents.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal(Decimal::new(4505, 3)).unwrap(); // 4.505
    /// assert_eq!(m.cents(), 451);
    /// ```
    pub fn from_decimal(amount: Decimal) -> CoreResult<Money> {
        let cents = round_half_up(amount * Decimal::ONE_HUNDRED, 0);
        let cents = cents.to_i64().ok_or_else(|| ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: i64::MIN.to_string(),
            max: i64::MAX.to_string(),
        })?;
        Ok(Money(cents))
    }

    /// Returns the value as a decimal with a scale of 2.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Whole currency units, rounded down (floor).
    ///
    /// Loyalty accrual uses this: $9.99 earns 9 points, no fractional carry.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(999).whole_units(), 9);
    /// assert_eq!(Money::from_cents(-50).whole_units(), -1);
    /// ```
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0.div_euclid(100)
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

    /// Calculates tax, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount * bps ± 5000) / 10000`.
    /// The ±5000 rounds the half cent away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use cafe_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(1995);  // $19.95
    /// let rate = TaxRate::from_bps(1000);      // 10%
    ///
    /// // $19.95 × 10% = $1.995 → rounds to $2.00
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 200);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let scaled = self.0 as i128 * rate.bps() as i128;
        let tax_cents = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(450);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 900);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Returns `pct` percent of this amount, rounded half-up to the cent.
    ///
    /// `pct` must lie in (0, 100].
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let subtotal = Money::from_cents(900);
    /// let ten_pct = subtotal.percentage(Decimal::TEN).unwrap();
    /// assert_eq!(ten_pct.cents(), 90);
    /// ```
    pub fn percentage(&self, pct: Decimal) -> CoreResult<Money> {
        validate_percentage(pct)?;
        let raw = Decimal::from(self.0) * pct / Decimal::ONE_HUNDRED;
        let cents = round_half_up(raw, 0)
            .to_i64()
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "percentage".to_string(),
                min: "0".to_string(),
                max: "100".to_string(),
            })?;
        Ok(Money(cents))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and receipts in tests. Front ends format for locale.
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
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

        let total: Money = vec![a, b, Money::from_cents(1)].into_iter().sum();
        assert_eq!(total.cents(), 1501);
    }

    #[test]
    fn test_tax_rounds_half_up_at_half_cent() {
        let rate = TaxRate::from_bps(1000);
        // 19.95 × 0.10 = 1.995 → 2.00
        assert_eq!(Money::from_cents(1995).calculate_tax(rate).cents(), 200);
        // 19.94 × 0.10 = 1.994 → 1.99
        assert_eq!(Money::from_cents(1994).calculate_tax(rate).cents(), 199);
        // 9.00 × 0.10 = 0.90
        assert_eq!(Money::from_cents(900).calculate_tax(rate).cents(), 90);
    }

    #[test]
    fn test_percentage_rounding() {
        let base = Money::from_cents(1005);
        // 10.05 × 15% = 1.5075 → 1.51
        assert_eq!(base.percentage(dec!(15)).unwrap().cents(), 151);
        // 10.05 × 50% = 5.025 → 5.03
        assert_eq!(base.percentage(dec!(50)).unwrap().cents(), 503);
        assert_eq!(base.percentage(dec!(100)).unwrap(), base);
    }

    #[test]
    fn test_percentage_rejects_out_of_range() {
        let base = Money::from_cents(1000);
        assert!(base.percentage(dec!(0)).is_err());
        assert!(base.percentage(dec!(-5)).is_err());
        assert!(base.percentage(dec!(100.01)).is_err());
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(Money::from_decimal(dec!(4.50)).unwrap().cents(), 450);
        assert_eq!(Money::from_decimal(dec!(0.005)).unwrap().cents(), 1);
        assert_eq!(Money::from_decimal(dec!(0.004)).unwrap().cents(), 0);
        assert_eq!(Money::from_cents(990).to_decimal(), dec!(9.90));
    }

    #[test]
    fn test_whole_units_floor() {
        assert_eq!(Money::from_cents(990).whole_units(), 9);
        assert_eq!(Money::from_cents(1000).whole_units(), 10);
        assert_eq!(Money::from_cents(99).whole_units(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(dec!(2.345), 2), dec!(2.35));
        assert_eq!(round_half_up(dec!(2.344), 2), dec!(2.34));
        assert_eq!(round_half_up(dec!(-2.345), 2), dec!(-2.35));
    }
}
