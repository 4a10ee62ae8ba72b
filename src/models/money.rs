//! Money type for representing currency amounts
//!
//! Backed by a `rust_decimal::Decimal` that is always rounded to two decimal
//! places with round-half-to-even, so every balance stays reproducible from
//! the amounts recorded in event histories.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// Number of decimal places every amount is kept at
pub const MONEY_SCALE: u32 = 2;

/// Amounts must stay strictly below this magnitude (10^13)
///
/// Stored documents carry amounts as JSON numbers; below this bound every
/// two-decimal amount survives the trip through `f64` unchanged.
pub const MAX_AMOUNT_UNITS: i64 = 10_000_000_000_000;

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

fn within_range(value: Decimal) -> bool {
    value.abs() < Decimal::from(MAX_AMOUNT_UNITS)
}

/// A signed monetary amount with two-decimal precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(Decimal);

impl Money {
    /// Create a Money amount, rounding half-to-even to two decimals
    pub fn new(value: Decimal) -> Self {
        Self(round(value))
    }

    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use potledger::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// assert_eq!(amount.to_string(), "10.50");
    /// ```
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal value
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Check if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Check if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Get the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Whether the amount is below the supported magnitude
    pub fn is_within_range(&self) -> bool {
        within_range(self.0)
    }

    /// Add two amounts, or `None` if the sum leaves the supported range
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0
            .checked_add(other.0)
            .map(round)
            .filter(|v| within_range(*v))
            .map(Self)
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "$10.50", "10", "10.555" (rounded).
    /// Amounts of 10^13 or more in magnitude are rejected.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest).replace(',', "");

        let value = Decimal::from_str(&rest)
            .map_err(|_| MoneyParseError::InvalidFormat(s.to_string()))?;

        let money = Self::new(if negative { -value } else { value });
        if !money.is_within_range() {
            return Err(MoneyParseError::OutOfRange(s.to_string()));
        }
        Ok(money)
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{}{:.2}", symbol, self.0.abs())
        } else {
            format!("{}{:.2}", symbol, self.0)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(serde::ser::Error::custom(format!(
                "amount {} cannot be represented as a JSON number",
                self.0
            ))),
        }
    }
}

/// Shapes an amount may take in a stored document
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(v) => Decimal::from(v),
            RawAmount::Float(v) => Decimal::from_f64(v).ok_or_else(|| {
                serde::de::Error::custom(format!("amount {} is not a finite decimal", v))
            })?,
            RawAmount::Text(s) => Decimal::from_str(s.trim())
                .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", s)))?,
        };
        let money = Money::new(value);
        if !money.is_within_range() {
            return Err(serde::de::Error::custom(format!(
                "amount {} is outside the supported range",
                money
            )));
        }
        Ok(money)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount too large: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.amount(), Decimal::new(105, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::zero().to_string(), "0.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_cents(5).format_with_symbol("$"), "$0.05");
        assert_eq!(Money::from_cents(-5).format_with_symbol("$"), "-$0.05");
    }

    #[test]
    fn test_rounds_half_to_even() {
        assert_eq!(Money::parse("2.675").unwrap(), Money::from_cents(268));
        assert_eq!(Money::parse("2.665").unwrap(), Money::from_cents(266));
        assert_eq!(Money::parse("-0.125").unwrap(), Money::from_cents(-12));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!(a + b, Money::from_cents(1250));
        assert_eq!(a - b, Money::from_cents(750));
        assert_eq!(-a, Money::from_cents(-1000));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap(), Money::from_cents(1050));
        assert_eq!(Money::parse("$10.50").unwrap(), Money::from_cents(1050));
        assert_eq!(Money::parse("-10.50").unwrap(), Money::from_cents(-1050));
        assert_eq!(Money::parse("10").unwrap(), Money::from_cents(1000));
        assert_eq!(Money::parse("1,200.5").unwrap(), Money::from_cents(120050));
        assert!(Money::parse("ten").is_err());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "10.5");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(1050));
    }

    #[test]
    fn test_deserializes_integers_and_strings() {
        let whole: Money = serde_json::from_str("100").unwrap();
        assert_eq!(whole, Money::from_cents(10000));
        let text: Money = serde_json::from_str("\"12.34\"").unwrap();
        assert_eq!(text, Money::from_cents(1234));
        let long: Money = serde_json::from_str("0.1").unwrap();
        assert_eq!(long, Money::from_cents(10));
    }

    #[test]
    fn test_largest_amounts_survive_json() {
        for cents in [
            999_999_999_999_999,
            -999_999_999_999_999,
            123_456_789_012_345,
            987_654_321_098_761,
            100_000_000_000_001,
        ] {
            let money = Money::from_cents(cents);
            let json = serde_json::to_string(&money).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            assert_eq!(back, money, "{} came back as {}", money, back);
        }
    }

    #[test]
    fn test_rejects_amounts_out_of_range() {
        assert_eq!(
            Money::parse("10000000000000"),
            Err(MoneyParseError::OutOfRange("10000000000000".into()))
        );
        assert!(Money::parse("123456789012345.67").is_err());
        assert!(Money::parse("-123456789012345.67").is_err());
        assert!(Money::parse("79228162514264337593543950335").is_err());
        assert!(Money::parse("9999999999999.99").is_ok());

        assert!(serde_json::from_str::<Money>("123456789012345.67").is_err());
        assert!(serde_json::from_str::<Money>("\"10000000000000\"").is_err());
        assert!(serde_json::from_str::<Money>("-10000000000000").is_err());
    }

    #[test]
    fn test_checked_add() {
        let top = Money::parse("9999999999999.99").unwrap();
        assert_eq!(
            top.checked_add(Money::from_cents(-99)),
            Some(Money::from_cents(999_999_999_999_900))
        );
        assert_eq!(top.checked_add(Money::from_cents(1)), None);
        assert_eq!((-top).checked_add(Money::from_cents(-1)), None);
        assert_eq!(
            Money::from_cents(1000).checked_add(Money::from_cents(-250)),
            Some(Money::from_cents(750))
        );
    }
}
