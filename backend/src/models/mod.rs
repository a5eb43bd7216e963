//! Database models for the CoffeeStudio calculator service
//!
//! Re-exports the calculator models from the shared crate and adds the
//! persisted records built around them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use shared::models::*;

/// Market observation key for the USD->EUR reference rate
pub const FX_USD_EUR_KEY: &str = "FX:USD_EUR";

/// A stored margin calculation for a lot
#[derive(Debug, Clone, Serialize)]
pub struct MarginRun {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub profile: String,
    pub computed_at: DateTime<Utc>,
    pub inputs: serde_json::Value,
    pub outputs: serde_json::Value,
}

/// Body of `POST /lots/{lot_id}/margin-runs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMarginRunInput {
    pub profile: Option<String>,
    #[serde(flatten)]
    pub request: MarginCalcRequest,
}

/// Stored scoring of one cooperative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcingAnalysis {
    pub id: Uuid,
    pub cooperative_id: Uuid,
    pub cooperative_name: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ScoringResult,
}

/// Body of `POST /peru/cooperatives/{id}/analyze`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeCooperativeInput {
    /// When false, an analysis already stored today is returned instead
    #[serde(default = "default_force_refresh")]
    pub force_refresh: bool,
}

fn default_force_refresh() -> bool {
    true
}

impl Default for AnalyzeCooperativeInput {
    fn default() -> Self {
        Self {
            force_refresh: default_force_refresh(),
        }
    }
}

/// One observed market value (FX rate, price index, freight quote)
#[derive(Debug, Clone, Serialize)]
pub struct MarketObservation {
    pub id: Uuid,
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub unit: Option<String>,
    pub currency: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
}

/// Body of `POST /market/observations`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMarketObservationInput {
    pub key: String,
    pub value: Decimal,
    pub unit: Option<String>,
    pub currency: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
}

/// A sourcing region with its FOB price benchmark
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub avg_fob_price_usd_per_kg: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /peru/regions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertRegionInput {
    pub name: String,
    pub avg_fob_price_usd_per_kg: Option<Decimal>,
}

/// Outcome of seeding the built-in region benchmarks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSeedSummary {
    pub created: usize,
    pub updated: usize,
    pub total: usize,
}
