//! Validation utilities for the CoffeeStudio calculators
//!
//! Each check returns `Result<(), &'static str>` so it can be recorded against
//! a field with [`ValidationError::check`]. Request types call these while
//! being converted into validated inputs; nothing downstream re-validates.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::models::Currency;

// ============================================================================
// Numeric Validations
// ============================================================================

/// Validate that a value is strictly positive
pub fn validate_positive(value: Decimal) -> Result<(), &'static str> {
    if value <= Decimal::ZERO {
        return Err("Value must be greater than zero");
    }
    Ok(())
}

/// Validate that a value is zero or positive
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Validate that a count is zero or positive
pub fn validate_count(count: i64) -> Result<(), &'static str> {
    if count < 0 {
        return Err("Count cannot be negative");
    }
    Ok(())
}

/// Validate green-to-roasted yield factor, which must lie in (0, 1]
pub fn validate_yield_factor(yield_factor: Decimal) -> Result<(), &'static str> {
    if yield_factor <= Decimal::ZERO || yield_factor > Decimal::ONE {
        return Err("yield_factor must be within (0, 1]");
    }
    Ok(())
}

/// Validate a 0-100 score
pub fn validate_score(score: Decimal) -> Result<(), &'static str> {
    if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
        return Err("Score must be between 0 and 100");
    }
    Ok(())
}

// ============================================================================
// Currency Validations
// ============================================================================

/// Parse an ISO currency code, recording an error against `field` when unknown
pub fn parse_currency(errors: &mut ValidationError, field: &str, code: &str) -> Option<Currency> {
    let currency = Currency::from_code(code);
    if currency.is_none() {
        errors.push_code(field, "invalid_currency", format!("Unsupported currency code '{}'", code.trim()));
    }
    currency
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(dec("0.01")).is_ok());
        assert!(validate_positive(Decimal::ZERO).is_err());
        assert!(validate_positive(dec("-5")).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(dec("12.5")).is_ok());
        assert!(validate_non_negative(dec("-0.001")).is_err());
    }

    #[test]
    fn test_validate_count() {
        assert!(validate_count(0).is_ok());
        assert!(validate_count(500).is_ok());
        assert!(validate_count(-1).is_err());
    }

    #[test]
    fn test_validate_yield_factor_bounds() {
        assert!(validate_yield_factor(dec("0.84")).is_ok());
        assert!(validate_yield_factor(Decimal::ONE).is_ok());
        assert!(validate_yield_factor(Decimal::ZERO).is_err());
        assert!(validate_yield_factor(dec("-0.5")).is_err());
        assert!(validate_yield_factor(dec("1.0001")).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(Decimal::ZERO).is_ok());
        assert!(validate_score(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_score(dec("100.5")).is_err());
        assert!(validate_score(dec("-1")).is_err());
    }

    #[test]
    fn test_parse_currency() {
        let mut errors = ValidationError::new();
        assert_eq!(parse_currency(&mut errors, "ccy", " eur "), Some(Currency::Eur));
        assert_eq!(parse_currency(&mut errors, "ccy", "USD"), Some(Currency::Usd));
        assert!(errors.is_empty());

        assert_eq!(parse_currency(&mut errors, "ccy", "XYZ"), None);
        assert!(errors.has_field("ccy"));
    }
}
