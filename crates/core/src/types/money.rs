//! Type-safe money representation using decimal arithmetic.

use core::fmt;
use std::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money with currency information.
///
/// Craftly prices everything in a single currency per listing. Amounts are
/// kept in the currency's standard unit (dollars, not cents) and serialized
/// as strings so no precision is lost in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a USD amount.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Create an amount from the smallest currency unit (e.g. cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(CurrencyCode::default()), |acc, m| {
            Self::new(acc.amount + m.amount, m.currency_code)
        })
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// The ISO code as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1999, CurrencyCode::USD).to_string(), "$19.99");
        assert_eq!(Money::from_cents(500, CurrencyCode::GBP).to_string(), "£5.00");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Money::from_cents(250, CurrencyCode::USD);
        let total: Money = [unit.times(2), unit.times(3)].into_iter().sum();
        assert_eq!(total, Money::from_cents(1250, CurrencyCode::USD));
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let total: Money = std::iter::empty().sum();
        assert!(!total.is_positive());
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("GBP".parse::<CurrencyCode>(), Ok(CurrencyCode::GBP));
        assert_eq!(CurrencyCode::CAD.as_str(), "CAD");
        assert!("usd".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let json = serde_json::to_value(Money::from_cents(1050, CurrencyCode::USD)).unwrap();
        assert_eq!(json["amount"], "10.50");
        assert_eq!(json["currency_code"], "USD");
    }
}
