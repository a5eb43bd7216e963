//! Currency codes and USD/EUR normalization

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// Supported ISO 4217 currency codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    /// Peruvian sol
    Pen,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Pen => "PEN",
            Currency::Gbp => "GBP",
        }
    }

    /// Parse a code case-insensitively, ignoring surrounding whitespace
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "PEN" => Some(Currency::Pen),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// USD->EUR rate used when a caller does not supply one
pub fn default_usd_to_eur() -> Decimal {
    Decimal::new(92, 2)
}

/// Source of the fallback USD->EUR rate
///
/// The rate itself is provided by the caller (configuration or the latest
/// market observation); conversion never performs I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRates {
    pub default_usd_to_eur: Decimal,
}

impl Default for FxRates {
    fn default() -> Self {
        Self {
            default_usd_to_eur: default_usd_to_eur(),
        }
    }
}

impl FxRates {
    pub fn new(default_usd_to_eur: Decimal) -> Self {
        Self { default_usd_to_eur }
    }

    /// Convert `amount` from one currency to another
    ///
    /// Same-currency amounts pass through untouched. USD and EUR convert
    /// through `fx_rate_usd_to_eur` when given, else the default rate. Every
    /// other pair is rejected.
    pub fn to_common_currency(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
        fx_rate_usd_to_eur: Option<Decimal>,
    ) -> Result<Decimal, CalcError> {
        if from == to {
            return Ok(amount);
        }

        let rate = fx_rate_usd_to_eur.unwrap_or(self.default_usd_to_eur);
        match (from, to) {
            (Currency::Usd, Currency::Eur) => amount
                .checked_mul(rate)
                .ok_or(CalcError::OutOfRange { from, to }),
            (Currency::Eur, Currency::Usd) if rate.is_zero() => Err(CalcError::InvalidCurrency { from, to }),
            (Currency::Eur, Currency::Usd) => amount
                .checked_div(rate)
                .ok_or(CalcError::OutOfRange { from, to }),
            _ => Err(CalcError::InvalidCurrency { from, to }),
        }
    }
}

/// Convert with the default fallback rate
pub fn to_common_currency(
    amount: Decimal,
    from: Currency,
    to: Currency,
    fx_rate_usd_to_eur: Option<Decimal>,
) -> Result<Decimal, CalcError> {
    FxRates::default().to_common_currency(amount, from, to, fx_rate_usd_to_eur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_same_currency_is_unchanged() {
        for ccy in [Currency::Usd, Currency::Eur, Currency::Pen, Currency::Gbp] {
            assert_eq!(to_common_currency(dec("12.34"), ccy, ccy, None).unwrap(), dec("12.34"));
        }
    }

    #[test]
    fn test_usd_to_eur_with_explicit_rate() {
        let eur = to_common_currency(dec("100"), Currency::Usd, Currency::Eur, Some(dec("0.85"))).unwrap();
        assert_eq!(eur, dec("85"));
    }

    #[test]
    fn test_usd_to_eur_uses_default_rate() {
        let rates = FxRates::new(dec("0.90"));
        let eur = rates
            .to_common_currency(dec("10"), Currency::Usd, Currency::Eur, None)
            .unwrap();
        assert_eq!(eur, dec("9"));
    }

    #[test]
    fn test_eur_to_usd_divides() {
        let usd = to_common_currency(dec("85"), Currency::Eur, Currency::Usd, Some(dec("0.85"))).unwrap();
        assert_eq!(usd, dec("100"));
    }

    #[test]
    fn test_unsupported_pair_rejected() {
        let err = to_common_currency(dec("10"), Currency::Pen, Currency::Gbp, None).unwrap_err();
        assert_eq!(
            err,
            CalcError::InvalidCurrency {
                from: Currency::Pen,
                to: Currency::Gbp
            }
        );
        assert!(to_common_currency(dec("10"), Currency::Usd, Currency::Pen, Some(dec("3.7"))).is_err());
    }

    #[test]
    fn test_conversion_overflow_reported() {
        let err = to_common_currency(Decimal::MAX, Currency::Eur, Currency::Usd, Some(dec("0.5"))).unwrap_err();
        assert_eq!(
            err,
            CalcError::OutOfRange {
                from: Currency::Eur,
                to: Currency::Usd
            }
        );
        assert!(to_common_currency(Decimal::MAX, Currency::Usd, Currency::Eur, Some(dec("2"))).is_err());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::Usd));
        assert_eq!(Currency::from_code(" Pen "), Some(Currency::Pen));
        assert_eq!(Currency::from_code("JPY"), None);
        assert_eq!(Currency::Eur.to_string(), "EUR");
    }
}
