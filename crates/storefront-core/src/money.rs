//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A BOGO pair of ₪299.90 + ₪149.90 against a ₪400 pair price must give   │
//! │  exactly ₪49.80 off on the server AND on the client receipt.            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (agorot)                             │
//! │    29990 + 14990 - 40000 = 4980    exact, every time                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Addition, subtraction and multiplication by a quantity are exact. The only
//! rounding step is [`Money::percentage_of`], which rounds half-up once, when a
//! percentage coupon turns an eligible subtotal into a visible discount.
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_cents(1099); // ₪10.99
//! let doubled = price * 2i64;          // ₪21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Currency symbol used by [`fmt::Display`] and bilingual messages.
pub const CURRENCY_SYMBOL: &str = "₪";

/// Basis points in 100%.
pub const BPS_SCALE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (agorot).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences may dip below zero before
///   being clamped; every externally visible discount or total is clamped
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support, serialized as a bare integer
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  CartLine.unit_price / sale_price ──► effective unit price              │
/// │                                          │                              │
/// │                      ┌───────────────────┴──────────────┐               │
/// │                      ▼                                  ▼               │
/// │              BOGO pair sums                     line subtotals          │
/// │                      │                                  │               │
/// │                      └──────────► coupon discount ◄─────┘               │
/// │                                          │                              │
/// │                                          ▼                              │
/// │                                 PriceBreakdown.total                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents ₪10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Clamps negative values to zero.
    ///
    /// Every discount and every final total passes through this before it
    /// leaves the engine.
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Subtracts and clamps the result at zero.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let pair = Money::from_cents(550);
    /// assert_eq!(pair.saturating_sub(Money::from_cents(450)).cents(), 100);
    /// assert_eq!(pair.saturating_sub(Money::from_cents(900)).cents(), 0);
    /// ```
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Self {
        Money(self.0 - other.0).clamp_non_negative()
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half-up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 is the half
    /// that makes 0.5 of a minor unit round up. Negative inputs are clamped
    /// to zero first, so the result is never negative.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(1000);
    /// // 8.25% of ₪10.00 = ₪0.825 → ₪0.83
    /// assert_eq!(subtotal.percentage_of(825).cents(), 83);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let base = self.clamp_non_negative().0 as i128;
        let scaled = (base * bps as i128 + (BPS_SCALE / 2) as i128) / BPS_SCALE as i128;
        Money::from_cents(scaled as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// Used inside bilingual coupon messages. Frontends with richer locale
/// formatting should format `cents()` themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{:02}",
            sign,
            CURRENCY_SYMBOL,
            self.major().abs(),
            self.minor_part()
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

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
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
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "₪10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "₪5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-₪5.50");
        assert_eq!(format!("{}", Money::zero()), "₪0.00");
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Money::from_cents(29990);
        let b = Money::from_cents(14990);

        assert_eq!((a + b).cents(), 44980);
        assert_eq!((a - b).cents(), 15000);
        assert_eq!((b * 3i64).cents(), 44970);
    }

    #[test]
    fn test_saturating_sub_never_negative() {
        let small = Money::from_cents(100);
        let large = Money::from_cents(900);

        assert_eq!(large.saturating_sub(small).cents(), 800);
        assert!(small.saturating_sub(large).is_zero());
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of ₪0.10 = 1.5 agorot → 2
        assert_eq!(Money::from_cents(10).percentage_of(1500).cents(), 2);
        // 10% of ₪0.14 = 1.4 agorot → 1
        assert_eq!(Money::from_cents(14).percentage_of(1000).cents(), 1);
        assert_eq!(Money::from_cents(10000).percentage_of(BPS_SCALE).cents(), 10000);
    }

    #[test]
    fn test_percentage_of_negative_is_zero() {
        assert!(Money::from_cents(-1000).percentage_of(5000).is_zero());
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert!(negative.clamp_non_negative().is_zero());
    }
}
