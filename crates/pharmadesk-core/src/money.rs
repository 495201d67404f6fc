//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend speaks decimal numbers:                                    │
//! │    "selling_price": 12.5, "gst_percent": 12                             │
//! │                                                                         │
//! │  Summing floats line by line drifts:                                    │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    12.5  ──► 1250 paise at the wire boundary                            │
//! │    every cart calculation stays in i64                                  │
//! │    1250 paise ──► 12.5 only when talking back to the backend            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmadesk_core::money::Money;
//!
//! let price = Money::from_minor(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! assert_eq!(doubled.minor(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Minor units per major unit (100 paise to the rupee).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results (subtotal + tax − discount) may
///   go negative before the grand total is floored at zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde**: serializes as minor units for view models; the backend wire
///   format goes through [`major_units`] instead
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Converts a decimal amount from the backend into minor units.
    ///
    /// Rounds to the nearest minor unit. Only used at the wire boundary;
    /// nothing inside the cart ever produces a float.
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(12.5).minor(), 1250);
    /// assert_eq!(Money::from_decimal(10.99).minor(), 1099);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * MINOR_PER_MAJOR as f64).round() as i64)
    }

    /// Returns the value as a decimal number for the backend.
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit portion.
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors the value at zero.
    ///
    /// A discount larger than the bill never produces a negative total.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, i.e. half rounds up
    /// for positive amounts.
    ///
    /// ## Example
    /// ```rust
    /// use pharmadesk_core::money::Money;
    /// use pharmadesk_core::types::TaxRate;
    ///
    /// let line = Money::from_major(20);
    /// let gst = line.calculate_tax(TaxRate::from_bps(500)); // 5%
    /// assert_eq!(gst, Money::from_major(1));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so large bills at 100% cannot overflow
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax as i64)
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Renders `21.00`, `-5.50`. The currency symbol belongs to the presenter.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major_part().abs(), self.minor_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Number-or-string as the backend sends it (`12.5` or `"12.50"`).
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    /// Parses the value; blank strings read as zero.
    pub(crate) fn to_f64(&self) -> Result<f64, String> {
        match self {
            Decimal::Number(n) => Ok(*n),
            Decimal::Text(s) if s.trim().is_empty() => Ok(0.0),
            Decimal::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid decimal '{}'", s)),
        }
    }
}

/// Serde adapter for money fields carried as decimal major units.
///
/// `null` and missing values read as zero (reports send `null` when a
/// period has no bills).
///
/// ```rust,ignore
/// #[serde(default, with = "crate::money::major_units")]
/// pub selling_price: Money,
/// ```
pub mod major_units {
    use super::{Decimal, Money};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.to_decimal())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        match Option::<Decimal>::deserialize(deserializer)? {
            None => Ok(Money::zero()),
            Some(raw) => raw
                .to_f64()
                .map(Money::from_decimal)
                .map_err(serde::de::Error::custom),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Priced {
        #[serde(default, with = "major_units")]
        price: Money,
    }

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major_part(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_major(21).to_string(), "21.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_minor(-400).floor_zero(), Money::zero());
        assert_eq!(Money::from_minor(400).floor_zero().minor(), 400);
    }

    #[test]
    fn test_tax_five_percent() {
        let line = Money::from_major(20);
        assert_eq!(line.calculate_tax(TaxRate::from_bps(500)).minor(), 100);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let amount = Money::from_minor(1000);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(825)).minor(), 83);
    }

    #[test]
    fn test_from_decimal_rounds_to_minor_unit() {
        assert_eq!(Money::from_decimal(12.5).minor(), 1250);
        assert_eq!(Money::from_decimal(9.999).minor(), 1000);
        assert_eq!(Money::from_decimal(f64::NAN), Money::zero());
        assert!((Money::from_minor(2150).to_decimal() - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_major_units_accepts_numbers_strings_and_null() {
        let p: Priced = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(p.price.minor(), 1250);

        let p: Priced = serde_json::from_str(r#"{"price": "7.25"}"#).unwrap();
        assert_eq!(p.price.minor(), 725);

        let p: Priced = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert!(p.price.is_zero());

        let p: Priced = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.price.is_zero());

        assert!(serde_json::from_str::<Priced>(r#"{"price": "abc"}"#).is_err());
    }

    #[test]
    fn test_major_units_serializes_decimal() {
        let json = serde_json::to_value(Priced { price: Money::from_minor(2100) }).unwrap();
        assert_eq!(json["price"], serde_json::json!(21.0));
    }
}
