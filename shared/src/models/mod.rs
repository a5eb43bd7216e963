//! Calculator inputs, results and scoring models

pub mod currency;
pub mod landed_cost;
pub mod margin;
pub mod recommendation;
pub mod sourcing;

pub use currency::*;
pub use landed_cost::*;
pub use margin::*;
pub use recommendation::*;
pub use sourcing::*;
