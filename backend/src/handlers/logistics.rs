//! HTTP handlers for logistics endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::{CurrentUser, READ_ROLES};
use crate::models::{LandedCostRequest, LandedCostResult};
use crate::services::LogisticsService;
use crate::AppState;

/// Itemized landed cost for a shipment
pub async fn calculate_landed_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<LandedCostRequest>,
) -> AppResult<Json<LandedCostResult>> {
    current_user.0.require_role(READ_ROLES)?;
    let service = LogisticsService::new(state.db);
    let result = service
        .landed_cost(request, state.config.fx.default_usd_to_eur)
        .await?;
    Ok(Json(result))
}
