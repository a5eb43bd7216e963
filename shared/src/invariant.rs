//! Computation invariants
//!
//! Calculators only ever see validated input. Each input's `parse` runs the
//! same checked arithmetic the calculator uses, so a [`Fault`] surfacing in a
//! calculator means a validation rule is missing and it aborts instead of
//! returning an error.

use rust_decimal::Decimal;

/// Failed arithmetic step, tagged with the input field responsible for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    ZeroDivisor(&'static str),
    Overflow(&'static str),
}

impl Fault {
    pub(crate) fn field(&self) -> &'static str {
        match self {
            Fault::ZeroDivisor(field) | Fault::Overflow(field) => field,
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fault::ZeroDivisor(field) => write!(f, "{} is zero", field),
            Fault::Overflow(field) => write!(f, "{} pushes a result out of the supported range", field),
        }
    }
}

pub(crate) fn quotient(numerator: Decimal, divisor: Decimal, divisor_field: &'static str) -> Result<Decimal, Fault> {
    if divisor.is_zero() {
        return Err(Fault::ZeroDivisor(divisor_field));
    }
    numerator.checked_div(divisor).ok_or(Fault::Overflow(divisor_field))
}

pub(crate) fn product(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, Fault> {
    a.checked_mul(b).ok_or(Fault::Overflow(field))
}

pub(crate) fn sum(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, Fault> {
    a.checked_add(b).ok_or(Fault::Overflow(field))
}

pub(crate) fn difference(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, Fault> {
    a.checked_sub(b).ok_or(Fault::Overflow(field))
}

/// Unwrap a figure computed from validated input
pub(crate) fn validated<T>(result: Result<T, Fault>) -> T {
    match result {
        Ok(value) => value,
        Err(fault) => panic!("computation invariant violated: {}", fault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotient() {
        assert_eq!(
            quotient(Decimal::from(63), Decimal::new(84, 1), "d"),
            Ok(Decimal::new(75, 1))
        );
    }

    #[test]
    fn test_zero_divisor_and_overflow_are_distinct() {
        assert_eq!(
            quotient(Decimal::ONE, Decimal::ZERO, "yield_factor"),
            Err(Fault::ZeroDivisor("yield_factor"))
        );
        assert_eq!(
            quotient(Decimal::MAX, Decimal::new(5, 1), "yield_factor"),
            Err(Fault::Overflow("yield_factor"))
        );
        assert_eq!(
            product(Decimal::MAX, Decimal::from(2), "weight_kg"),
            Err(Fault::Overflow("weight_kg"))
        );
        assert_eq!(sum(Decimal::MAX, Decimal::ONE, "freight_usd").unwrap_err().field(), "freight_usd");
    }

    #[test]
    #[should_panic(expected = "computation invariant violated: yield_factor is zero")]
    fn test_zero_divisor_is_fatal() {
        validated(quotient(Decimal::ONE, Decimal::ZERO, "yield_factor"));
    }

    #[test]
    #[should_panic(expected = "computation invariant violated: selling_price_per_kg pushes a result out of the supported range")]
    fn test_overflow_is_fatal() {
        validated(quotient(Decimal::MAX, Decimal::new(1, 3), "selling_price_per_kg"));
    }
}
