use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// A monetary amount held at two decimal places.
///
/// Every constructor rounds half away from zero, so `527.115` becomes
/// `527.12` and `-527.115` becomes `-527.12`. Addition and subtraction
/// saturate at the bounds of [`Decimal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn amount(self) -> Decimal {
        self.0
    }

    /// Multiplies by an exchange rate and rounds the product back to cents.
    /// `None` when the product does not fit.
    pub fn checked_convert(self, rate: Decimal) -> Option<Money> {
        self.0.checked_mul(rate).map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(decimal: Decimal) -> Self {
        Money::from_decimal(decimal)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec("527.115")), Money::from_cents(52712));
        assert_eq!(Money::from_decimal(dec("-527.115")), Money::from_cents(-52712));
        assert_eq!(Money::from_decimal(dec("0.125")), Money::from_cents(13));
    }

    #[test]
    fn keeps_integers_intact() {
        assert_eq!(Money::from_decimal(dec("527")), Money::from_cents(52700));
    }

    #[test]
    fn convert_rounds_product() {
        let price = Money::from_decimal(dec("1234567"));
        let converted = price.checked_convert(dec("0.251957"));
        assert_eq!(converted, Some(Money::from_cents(31105780)));
    }

    #[test]
    fn convert_overflow_is_none() {
        let price = Money::from_decimal(Decimal::MAX);
        assert_eq!(price.checked_convert(dec("90")), None);
        assert_eq!(price.checked_convert(Decimal::ONE), Some(price));
    }

    #[test]
    fn addition_saturates() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(max + Money::from_cents(100), max);
        assert_eq!(-max - Money::from_cents(100), -max);
        let total: Money = [max, max, Money::from_cents(-1)].into_iter().sum();
        assert_eq!(total, max + Money::from_cents(-1));
    }

    #[test]
    fn display_always_has_two_places() {
        assert_eq!(Money::from_cents(52700).to_string(), "527.00");
        assert_eq!((-Money::from_cents(52711)).to_string(), "-527.11");
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [100, 250, -50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(300));
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_string(&Money::from_cents(52711)).unwrap();
        assert_eq!(json, "527.11");
    }
}
