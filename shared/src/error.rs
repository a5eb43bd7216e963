//! Error types for the calculator core
//!
//! Every user-facing failure belongs to the validation family: either a
//! [`ValidationError`] carrying one entry per offending field, or an
//! unsupported currency conversion. Both are raised while a request is turned
//! into a validated input, never by the calculators themselves.

use serde::Serialize;
use thiserror::Error;

use crate::invariant::Fault;
use crate::models::Currency;

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    /// Machine-readable reason: `required`, `invalid_value`, `invalid_currency`
    /// or `out_of_range`
    pub code: String,
    pub message: String,
}

/// All field problems found in one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("Validation failed: {}", describe(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error with exactly one field problem
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.push_code(field, "invalid_value", message);
    }

    pub fn push_code(&mut self, field: &str, code: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        });
    }

    /// Record the outcome of one of the `validate_*` checks
    pub fn check(&mut self, field: &str, result: Result<(), &'static str>) {
        if let Err(message) = result {
            self.push(field, message);
        }
    }

    /// Record an arithmetic fault found while pre-computing validated figures
    pub(crate) fn push_fault(&mut self, fault: Fault) {
        self.push_code(fault.field(), "out_of_range", fault.to_string());
    }

    /// Record a missing required field, passing the value through when present
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push_code(field, "required", "Field is required");
        }
        value
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Errors raised by the calculator core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Conversion requested between a pair without a known rate
    #[error("Unsupported currency conversion: {from} -> {to}")]
    InvalidCurrency { from: Currency, to: Currency },

    /// Converted amount does not fit the decimal range
    #[error("Converted amount out of range: {from} -> {to}")]
    OutOfRange { from: Currency, to: Currency },
}

impl CalcError {
    /// Flatten into field-level form, attributing currency failures to `field`
    pub fn into_validation(self, field: &str) -> ValidationError {
        match self {
            CalcError::Validation(errors) => errors,
            CalcError::InvalidCurrency { .. } => {
                let mut errors = ValidationError::new();
                errors.push_code(field, "invalid_currency", self.to_string());
                errors
            }
            CalcError::OutOfRange { .. } => {
                let mut errors = ValidationError::new();
                errors.push_code(field, "out_of_range", self.to_string());
                errors
            }
        }
    }
}
