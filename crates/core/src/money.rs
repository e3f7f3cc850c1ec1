use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid amount: {0}")]
pub struct AmountError(pub String);

/// Transfer amount in dirhams. Keeps the scale it was parsed with, so a
/// zero-padded `0000000250000.00` prints back as `250000.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn from_decimal(decimal: Decimal) -> Self {
        Amount(decimal)
    }

    pub fn zero() -> Self {
        Amount(Decimal::ZERO)
    }

    /// Accepts zero-padded SIMT amounts, plain decimals and `,` as decimal
    /// separator.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let clean = s.trim().replace(',', ".");
        if clean.is_empty() {
            return Err(AmountError(s.to_string()));
        }
        Decimal::from_str(&clean)
            .map(Amount)
            .map_err(|_| AmountError(s.to_string()))
    }

    /// `amount * 10^scale`, rounded half away from zero.
    pub fn scaled(self, scale: u32) -> Option<i64> {
        let factor = Decimal::from(10i64.checked_pow(scale)?);
        self.0
            .checked_mul(factor)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Renders with exactly `places` fraction digits.
    pub fn to_fixed(self, places: u32) -> String {
        let mut d = self
            .0
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        d.rescale(places);
        d.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_zero_padded() {
        let a = Amount::parse("0000000250000.00").unwrap();
        assert_eq!(a.to_string(), "250000.00");
        assert_eq!(a.scaled(2), Some(25_000_000));
    }

    #[test]
    fn parse_comma_separator() {
        assert_eq!(Amount::parse("12,5").unwrap().scaled(2), Some(1250));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("   ").is_err());
        assert!(Amount::parse("MAD12").is_err());
    }

    #[test]
    fn scaled_rounds_half_away_from_zero() {
        assert_eq!(Amount::parse("1.005").unwrap().scaled(2), Some(101));
        assert_eq!(Amount::parse("-1.005").unwrap().scaled(2), Some(-101));
        assert_eq!(Amount::parse("7").unwrap().scaled(0), Some(7));
    }

    #[test]
    fn scaled_overflow_is_none() {
        assert_eq!(Amount::parse("1").unwrap().scaled(40), None);
    }

    #[test]
    fn to_fixed_pads_and_rounds() {
        assert_eq!(Amount::parse("250000").unwrap().to_fixed(2), "250000.00");
        assert_eq!(Amount::parse("0000943750.755").unwrap().to_fixed(2), "943750.76");
    }

    #[test]
    fn sum_keeps_scale() {
        let total: Amount = ["250000.00", "693750.75"]
            .iter()
            .map(|s| Amount::parse(s).unwrap())
            .sum();
        assert_eq!(total.to_string(), "943750.75");
    }
}
