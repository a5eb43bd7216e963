//! Market observation store and USD->EUR rate resolution
//!
//! Observations are global reference data shared by all tenants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::ValidationError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::ecb_fx::{EcbFxClient, ECB_SOURCE_NAME};
use crate::models::{CreateMarketObservationInput, FxRates, MarketObservation, FX_USD_EUR_KEY};

/// Upper bound for observation listings
pub const MAX_OBSERVATIONS: i64 = 500;

type ObservationRow = (
    Uuid,
    String,
    Decimal,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    Option<String>,
    Option<String>,
);

fn observation_from_row(row: ObservationRow) -> MarketObservation {
    let (id, key, value, unit, currency, observed_at, source_name, source_url) = row;
    MarketObservation {
        id,
        key,
        value,
        unit,
        currency,
        observed_at,
        source_name,
        source_url,
    }
}

#[derive(Clone)]
pub struct FxService {
    db: PgPool,
}

impl FxService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Newest stored USD->EUR rate, if any
    pub async fn latest_usd_to_eur(&self) -> AppResult<Option<Decimal>> {
        let rate = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT value FROM market_observations
            WHERE key = $1
            ORDER BY observed_at DESC
            LIMIT 1
            "#,
        )
        .bind(FX_USD_EUR_KEY)
        .fetch_optional(&self.db)
        .await?;

        Ok(rate.filter(|r| *r > Decimal::ZERO))
    }

    /// Fallback rates for conversion: newest observation, else `configured_default`
    pub async fn rates(&self, configured_default: Decimal) -> AppResult<FxRates> {
        match self.latest_usd_to_eur().await? {
            Some(rate) => Ok(FxRates::new(rate)),
            None => {
                tracing::warn!(
                    default_usd_to_eur = %configured_default,
                    "No {} observation stored, using configured default",
                    FX_USD_EUR_KEY
                );
                Ok(FxRates::new(configured_default))
            }
        }
    }

    /// Insert an observation, replacing any value stored for the same key and time
    pub async fn record_observation(
        &self,
        input: CreateMarketObservationInput,
    ) -> AppResult<MarketObservation> {
        let mut errors = ValidationError::new();
        let key = input.key.trim().to_string();
        if key.is_empty() {
            errors.push_code("key", "required", "key is required");
        } else if key.len() > 64 {
            errors.push("key", "key must be at most 64 characters");
        }
        if key == FX_USD_EUR_KEY && input.value <= Decimal::ZERO {
            errors.push("value", "exchange rate must be greater than zero");
        }
        if let Some(currency) = &input.currency {
            if currency.trim().len() != 3 {
                errors.push("currency", "currency must be a three-letter code");
            }
        }
        errors.into_result()?;

        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            INSERT INTO market_observations (key, value, unit, currency, observed_at, source_name, source_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key, observed_at) DO UPDATE SET
                value = EXCLUDED.value,
                unit = EXCLUDED.unit,
                currency = EXCLUDED.currency,
                source_name = EXCLUDED.source_name,
                source_url = EXCLUDED.source_url
            RETURNING id, key, value, unit, currency, observed_at, source_name, source_url
            "#,
        )
        .bind(&key)
        .bind(input.value)
        .bind(&input.unit)
        .bind(input.currency.as_deref().map(|c| c.trim().to_uppercase()))
        .bind(input.observed_at)
        .bind(&input.source_name)
        .bind(&input.source_url)
        .fetch_one(&self.db)
        .await?;

        let observation = observation_from_row(row);
        tracing::info!(
            key = %observation.key,
            value = %observation.value,
            observed_at = %observation.observed_at,
            "Market observation recorded"
        );
        Ok(observation)
    }

    /// Observations for one key, newest first
    pub async fn list_observations(&self, key: &str, limit: i64) -> AppResult<Vec<MarketObservation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT id, key, value, unit, currency, observed_at, source_name, source_url
            FROM market_observations
            WHERE key = $1
            ORDER BY observed_at DESC
            LIMIT $2
            "#,
        )
        .bind(key)
        .bind(limit.clamp(1, MAX_OBSERVATIONS))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(observation_from_row).collect())
    }

    /// Pull today's ECB reference rate and store it as an `FX:USD_EUR` observation
    pub async fn refresh_from_ecb(&self, client: &EcbFxClient) -> AppResult<MarketObservation> {
        let rate = client.fetch_usd_to_eur().await?;
        if rate.usd_to_eur <= Decimal::ZERO {
            return Err(AppError::ExternalService("ECB rate is not positive".to_string()));
        }

        self.record_observation(CreateMarketObservationInput {
            key: FX_USD_EUR_KEY.to_string(),
            value: rate.usd_to_eur,
            unit: Some("EUR/USD".to_string()),
            currency: Some("EUR".to_string()),
            observed_at: rate.observed_at,
            source_name: Some(ECB_SOURCE_NAME.to_string()),
            source_url: Some(rate.source_url),
        })
        .await
    }
}
