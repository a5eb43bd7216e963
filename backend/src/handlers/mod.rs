//! HTTP handlers for the CoffeeStudio calculator API

pub mod health;
pub mod logistics;
pub mod margin;
pub mod market;
pub mod region;
pub mod sourcing;

pub use health::health_check;
pub use logistics::calculate_landed_cost;
pub use margin::{calculate_margin, create_margin_run, list_margin_runs};
pub use market::{create_observation, list_observations, refresh_fx_rate};
pub use region::{list_regions, seed_regions, upsert_region};
pub use sourcing::{analyze_cooperative, get_sourcing_analysis};
