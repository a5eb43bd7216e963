//! HTTP handlers for Peru cooperative sourcing analysis

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use shared::ValidationError;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, READ_ROLES, WRITE_ROLES};
use crate::models::{AnalyzeCooperativeInput, SourcingAnalysis};
use crate::services::SourcingService;
use crate::AppState;

fn sourcing_service(state: &AppState) -> SourcingService {
    SourcingService::new(
        state.db.clone(),
        state.config.scoring.clone(),
        state.config.benchmark.default_fob_usd_per_kg,
    )
}

/// Decode the optional analyze body; only an empty body means "use defaults"
pub fn parse_analyze_body(body: &[u8]) -> Result<AnalyzeCooperativeInput, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnalyzeCooperativeInput::default());
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::single("body", format!("Invalid request body: {}", e)))
}

/// Score a cooperative and store the analysis
pub async fn analyze_cooperative(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(cooperative_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<SourcingAnalysis>> {
    current_user.0.require_role(WRITE_ROLES)?;
    let input = parse_analyze_body(&body)?;
    let analysis = sourcing_service(&state)
        .analyze(current_user.0.tenant_id, cooperative_id, input)
        .await?;
    Ok(Json(analysis))
}

/// Latest stored analysis for a cooperative
pub async fn get_sourcing_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(cooperative_id): Path<Uuid>,
) -> AppResult<Json<SourcingAnalysis>> {
    current_user.0.require_role(READ_ROLES)?;
    let analysis = sourcing_service(&state)
        .latest_analysis(current_user.0.tenant_id, cooperative_id)
        .await?;
    Ok(Json(analysis))
}
