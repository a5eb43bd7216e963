//! Margin & sourcing calculators for the CoffeeStudio import pipeline
//!
//! Pure functions over validated inputs, shared by the backend service and
//! the dashboard (via WASM). Requests are validated once when they are
//! converted into input types; the calculators never fail on those inputs.

pub mod error;
mod invariant;
pub mod models;
pub mod thresholds;
pub mod validation;

pub use error::*;
pub use models::*;
pub use thresholds::*;
pub use validation::*;
