//! HTTP handlers for margin calculation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, READ_ROLES, WRITE_ROLES};
use crate::models::{CreateMarginRunInput, MarginCalcRequest, MarginCalcResult, MarginRun};
use crate::services::MarginService;
use crate::AppState;

/// Compute a margin without storing it
pub async fn calculate_margin(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<MarginCalcRequest>,
) -> AppResult<Json<MarginCalcResult>> {
    current_user.0.require_role(READ_ROLES)?;
    let result = MarginService::calculate(request, &state.config.fx.rates())?;
    Ok(Json(result))
}

/// Compute and store a margin run for a lot
pub async fn create_margin_run(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<CreateMarginRunInput>,
) -> AppResult<(StatusCode, Json<MarginRun>)> {
    current_user.0.require_role(WRITE_ROLES)?;
    let service = MarginService::new(state.db);
    let run = service
        .create_run(
            current_user.0.tenant_id,
            lot_id,
            &current_user.0.user_id,
            input,
            &state.config.fx.rates(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

#[derive(Debug, Serialize)]
pub struct MarginRunList {
    pub lot_id: Uuid,
    pub runs: Vec<MarginRun>,
}

/// Margin run history for a lot, newest first
pub async fn list_margin_runs(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<MarginRunList>> {
    current_user.0.require_role(READ_ROLES)?;
    let service = MarginService::new(state.db);
    let runs = service.list_runs(current_user.0.tenant_id, lot_id).await?;
    Ok(Json(MarginRunList { lot_id, runs }))
}
