//! Type-safe price representation using decimal arithmetic.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a price from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price is not a number: {0:?}")]
    NotANumber(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price has more than {} decimal places", MAX_SCALE)]
    TooPrecise,
    #[error("price must be below {}", Price::LIMIT)]
    TooLarge,
}

/// Decimal places a stored price keeps.
pub const MAX_SCALE: u32 = 2;

/// Unit price of an item instance.
///
/// Stored as an exact decimal so that `19.99` round-trips through the
/// database without float drift. Always non-negative, below
/// [`Price::LIMIT`] and with at most two decimal places, which is what a
/// `NUMERIC(10, 2)` column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound: eight integer digits.
    pub const LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Wrap an amount.
    ///
    /// Trailing zeros don't count as decimal places, so `1.500` is accepted
    /// and `1.505` is not.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero,
    /// `PriceError::TooPrecise` for fractions of a cent and
    /// `PriceError::TooLarge` for amounts of [`Self::LIMIT`] or more.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > MAX_SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber(trimmed.to_string()))?;
        Self::new(amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        let price: Price = " 19.99 ".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_display_pads_cents() {
        let price: Price = "5".parse().unwrap();
        assert_eq!(price.display(), "$5.00");
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!("-1".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(
            "ten".parse::<Price>(),
            Err(PriceError::NotANumber("ten".to_string()))
        );
        assert!("".parse::<Price>().is_err());
    }

    #[test]
    fn test_rejects_fractions_of_a_cent() {
        assert_eq!("19.999".parse::<Price>(), Err(PriceError::TooPrecise));
        assert_eq!("0.001".parse::<Price>(), Err(PriceError::TooPrecise));
        let price: Price = "1.500".parse().unwrap();
        assert_eq!(price.display(), "$1.50");
    }

    #[test]
    fn test_rejects_amounts_past_eight_digits() {
        assert_eq!("100000000".parse::<Price>(), Err(PriceError::TooLarge));
        assert_eq!(
            "123456789.999".parse::<Price>(),
            Err(PriceError::TooPrecise)
        );
        assert_eq!("123456789.99".parse::<Price>(), Err(PriceError::TooLarge));
        let max: Price = "99999999.99".parse().unwrap();
        assert_eq!(max.amount(), Decimal::new(9_999_999_999, 2));
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!("0".parse::<Price>().unwrap(), Price::ZERO);
    }
}
