//! HTTP handlers for sourcing regions and their price benchmarks

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, READ_ROLES, WRITE_ROLES};
use crate::models::{Region, RegionSeedSummary, UpsertRegionInput};
use crate::services::RegionService;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegionList {
    pub regions: Vec<Region>,
}

/// Regions of the caller's tenant
pub async fn list_regions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<RegionList>> {
    current_user.0.require_role(READ_ROLES)?;
    let regions = RegionService::new(state.db).list(current_user.0.tenant_id).await?;
    Ok(Json(RegionList { regions }))
}

/// Create a region or update its FOB benchmark
pub async fn upsert_region(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpsertRegionInput>,
) -> AppResult<Json<Region>> {
    current_user.0.require_role(WRITE_ROLES)?;
    let region = RegionService::new(state.db)
        .upsert(current_user.0.tenant_id, input)
        .await?;
    Ok(Json(region))
}

/// Load the built-in Peruvian region benchmarks
pub async fn seed_regions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<RegionSeedSummary>> {
    current_user.0.require_role(WRITE_ROLES)?;
    let summary = RegionService::new(state.db).seed(current_user.0.tenant_id).await?;
    Ok(Json(summary))
}
