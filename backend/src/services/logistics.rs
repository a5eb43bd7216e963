//! Landed cost service

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{calculate_landed_cost, FxRates, LandedCostInput, LandedCostRequest, LandedCostResult};
use crate::services::fx::FxService;

#[derive(Clone)]
pub struct LogisticsService {
    db: PgPool,
}

/// Whether the request needs a stored or configured fallback rate
pub fn needs_fallback_rate(request: &LandedCostRequest) -> bool {
    request.settlement_currency.is_some() && request.fx_usd_to_eur.is_none()
}

impl LogisticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute landed cost, resolving the fallback FX rate only when conversion needs one
    pub async fn landed_cost(
        &self,
        request: LandedCostRequest,
        configured_usd_to_eur: Decimal,
    ) -> AppResult<LandedCostResult> {
        let fx = if needs_fallback_rate(&request) {
            FxService::new(self.db.clone())
                .rates(configured_usd_to_eur)
                .await?
        } else {
            FxRates::new(configured_usd_to_eur)
        };

        let input = LandedCostInput::parse(request, &fx)?;
        let result = calculate_landed_cost(&input);

        tracing::debug!(
            incoterm = %result.incoterm,
            total = %result.total_landed_cost,
            "Landed cost calculated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_rate_only_for_settlement_without_rate() {
        let mut request = LandedCostRequest::default();
        assert!(!needs_fallback_rate(&request));

        request.settlement_currency = Some("EUR".into());
        assert!(needs_fallback_rate(&request));

        request.fx_usd_to_eur = Some(Decimal::new(9, 1));
        assert!(!needs_fallback_rate(&request));
    }
}
