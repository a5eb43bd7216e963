//! Margin calculation service: ad-hoc calculations and per-lot run history

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    calculate_margin, CreateMarginRunInput, FxRates, MarginCalcInput, MarginCalcRequest,
    MarginCalcResult, MarginRun,
};

/// Profile name stored when a run does not name one
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Clone)]
pub struct MarginService {
    db: PgPool,
}

impl MarginService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate and compute without touching the database
    pub fn calculate(request: MarginCalcRequest, fx: &FxRates) -> AppResult<MarginCalcResult> {
        let input = MarginCalcInput::parse(request, fx)?;
        Ok(calculate_margin(&input))
    }

    /// Compute a margin for a lot and store it as a run
    pub async fn create_run(
        &self,
        tenant_id: Uuid,
        lot_id: Uuid,
        created_by: &str,
        input: CreateMarginRunInput,
        fx: &FxRates,
    ) -> AppResult<MarginRun> {
        self.ensure_lot(tenant_id, lot_id).await?;

        let profile = input
            .profile
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROFILE)
            .to_string();
        let result = Self::calculate(input.request, fx)?;

        let inputs = serde_json::to_value(&result.inputs)
            .map_err(|e| AppError::Internal(format!("Failed to encode margin inputs: {}", e)))?;
        let outputs = serde_json::to_value(&result.outputs)
            .map_err(|e| AppError::Internal(format!("Failed to encode margin outputs: {}", e)))?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO margin_runs (tenant_id, lot_id, profile, computed_at, inputs, outputs, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(lot_id)
        .bind(&profile)
        .bind(result.computed_at)
        .bind(&inputs)
        .bind(&outputs)
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            run_id = %id,
            lot_id = %lot_id,
            margin_pct = %result.outputs.margin_pct,
            "Margin run stored"
        );

        Ok(MarginRun {
            id,
            lot_id,
            profile,
            computed_at: result.computed_at,
            inputs,
            outputs,
        })
    }

    /// Margin runs for a lot, newest first
    pub async fn list_runs(&self, tenant_id: Uuid, lot_id: Uuid) -> AppResult<Vec<MarginRun>> {
        self.ensure_lot(tenant_id, lot_id).await?;

        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>, serde_json::Value, serde_json::Value)>(
            r#"
            SELECT id, lot_id, profile, computed_at, inputs, outputs
            FROM margin_runs
            WHERE tenant_id = $1 AND lot_id = $2
            ORDER BY computed_at DESC, id DESC
            "#,
        )
        .bind(tenant_id)
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, lot_id, profile, computed_at, inputs, outputs)| MarginRun {
                id,
                lot_id,
                profile,
                computed_at,
                inputs,
                outputs,
            })
            .collect())
    }

    async fn ensure_lot(&self, tenant_id: Uuid, lot_id: Uuid) -> AppResult<()> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM lots WHERE id = $1 AND tenant_id = $2")
            .bind(lot_id)
            .bind(tenant_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_calculate_reports_every_invalid_field() {
        let err = MarginService::calculate(MarginCalcRequest::default(), &FxRates::default())
            .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert!(errors.has_field("purchase_price_per_kg"));
                assert!(errors.has_field("selling_price_per_kg"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_calculate_margin_scenario() {
        let request = MarginCalcRequest {
            purchase_price_per_kg: Some(dec("5.0")),
            purchase_currency: Some("USD".into()),
            landed_costs_per_kg: Some(dec("1.0")),
            roast_and_pack_costs_per_kg: Some(dec("2.0")),
            yield_factor: Some(dec("0.8")),
            selling_price_per_kg: Some(dec("13.1034")),
            selling_currency: Some("USD".into()),
            fx_usd_to_eur: None,
        };
        let result = MarginService::calculate(request, &FxRates::default()).unwrap();
        assert_eq!(result.outputs.total_cost_per_kg_roasted, dec("9.5"));
    }
}
