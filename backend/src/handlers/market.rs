//! HTTP handlers for market reference data

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::external::EcbFxClient;
use crate::middleware::{CurrentUser, Role, READ_ROLES, WRITE_ROLES};
use crate::models::{CreateMarketObservationInput, MarketObservation, FX_USD_EUR_KEY};
use crate::services::FxService;
use crate::AppState;

/// Query parameters for listing observations
#[derive(Debug, Deserialize)]
pub struct ListObservationsQuery {
    pub key: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ObservationList {
    pub key: String,
    pub observations: Vec<MarketObservation>,
}

/// Observations for one key, newest first (defaults to `FX:USD_EUR`)
pub async fn list_observations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListObservationsQuery>,
) -> AppResult<Json<ObservationList>> {
    current_user.0.require_role(READ_ROLES)?;
    let key = query.key.unwrap_or_else(|| FX_USD_EUR_KEY.to_string());
    let service = FxService::new(state.db);
    let observations = service
        .list_observations(&key, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(ObservationList { key, observations }))
}

/// Record a market observation
pub async fn create_observation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMarketObservationInput>,
) -> AppResult<(StatusCode, Json<MarketObservation>)> {
    current_user.0.require_role(WRITE_ROLES)?;
    let service = FxService::new(state.db);
    let observation = service.record_observation(input).await?;
    Ok((StatusCode::CREATED, Json(observation)))
}

/// Fetch the ECB USD->EUR reference rate and store it
pub async fn refresh_fx_rate(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MarketObservation>> {
    current_user.0.require_role(&[Role::Admin])?;
    let client = EcbFxClient::new(state.config.fx.ecb_url.clone());
    let service = FxService::new(state.db);
    let observation = service.refresh_from_ecb(&client).await?;
    Ok(Json(observation))
}
