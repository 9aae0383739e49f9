//! Type-safe price representation using decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store currency.
    #[must_use]
    pub fn store(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format for display with thousands separators, e.g. `$1,234.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fixed = format!("{:.2}", rounded.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{}{grouped}.{cents}", self.currency_code.symbol())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ARS | Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::store(Decimal::new(123_450, 2)).display(), "$1,234.50");
        assert_eq!(Price::store(Decimal::new(1_000_000, 0)).display(), "$1,000,000.00");
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::store(Decimal::ZERO).display(), "$0.00");
        assert_eq!(Price::store(Decimal::new(999, 0)).display(), "$999.00");
        assert_eq!(Price::store(Decimal::new(5, 1)).display(), "$0.50");
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::store(Decimal::new(10_005, 3)).display(), "$10.01");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::store(Decimal::new(-25_000, 1)).display(), "-$2,500.00");
    }

    #[test]
    fn test_display_euro_symbol() {
        let price = Price::new(Decimal::new(42, 0), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "€42.00");
    }
}
