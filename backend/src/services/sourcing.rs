//! Cooperative sourcing analysis service
//!
//! Loads a cooperative's stored profile, scores it and keeps the analysis
//! history. The latest summary is also written back onto the cooperative.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use shared::{ScoringConfig, ValidationError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    AnalyzeCooperativeInput, CooperativeProfileData, CooperativeSourcingProfile, DigitalFootprint,
    ScoringResult, SourcingAnalysis, SourcingScorer,
};

#[derive(Clone)]
pub struct SourcingService {
    db: PgPool,
    scorer: SourcingScorer,
    default_benchmark_usd_per_kg: Decimal,
}

/// Cooperative row as stored
type CooperativeRow = (
    String,
    Option<String>,
    Option<Decimal>,
    Option<String>,
    Option<serde_json::Value>,
    Option<Decimal>,
    Option<serde_json::Value>,
    Option<serde_json::Value>,
    Option<serde_json::Value>,
    Option<serde_json::Value>,
    Option<serde_json::Value>,
);

/// Decode a nullable JSONB column, treating NULL as an empty record
fn decode_column<T: DeserializeOwned + Default>(
    errors: &mut ValidationError,
    field: &str,
    value: Option<serde_json::Value>,
) -> T {
    match value {
        None | Some(serde_json::Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            errors.push(field, format!("Stored {} is malformed: {}", field, e));
            T::default()
        }),
    }
}

/// Build the scoring snapshot from a stored cooperative row
pub fn profile_from_row(
    row: CooperativeRow,
    regional_benchmark_usd_per_kg: Decimal,
    snapshot_date: NaiveDate,
) -> Result<(String, CooperativeSourcingProfile), ValidationError> {
    let (
        name,
        _region,
        altitude_m,
        website,
        certifications,
        quality_score,
        operational_data,
        export_readiness,
        financial_data,
        communication_metrics,
        digital_footprint,
    ) = row;

    let mut errors = ValidationError::new();
    let mut digital_footprint: DigitalFootprint =
        decode_column(&mut errors, "digital_footprint", digital_footprint);
    let footprint_has_website = digital_footprint
        .website
        .as_deref()
        .is_some_and(|w| !w.trim().is_empty());
    if !footprint_has_website {
        digital_footprint.website = website.filter(|w| !w.trim().is_empty());
    }

    let data = CooperativeProfileData {
        operational_data: decode_column(&mut errors, "operational_data", operational_data),
        export_readiness: decode_column(&mut errors, "export_readiness", export_readiness),
        financial_data: decode_column(&mut errors, "financial_data", financial_data),
        communication_metrics: decode_column(&mut errors, "communication_metrics", communication_metrics),
        digital_footprint,
        certifications: decode_column(&mut errors, "certifications", certifications),
        altitude_m,
        quality_score,
        regional_benchmark_usd_per_kg: Some(regional_benchmark_usd_per_kg),
        snapshot_date: Some(snapshot_date),
    };
    errors.into_result()?;

    Ok((name, CooperativeSourcingProfile::parse(data)?))
}

impl SourcingService {
    pub fn new(db: PgPool, scoring: ScoringConfig, default_benchmark_usd_per_kg: Decimal) -> Self {
        Self {
            db,
            scorer: SourcingScorer::new(scoring),
            default_benchmark_usd_per_kg,
        }
    }

    /// Score a cooperative and store the analysis
    ///
    /// With `force_refresh` false an analysis already stored today is returned as is.
    pub async fn analyze(
        &self,
        tenant_id: Uuid,
        cooperative_id: Uuid,
        input: AnalyzeCooperativeInput,
    ) -> AppResult<SourcingAnalysis> {
        if !input.force_refresh {
            if let Some(existing) = self.latest_stored(tenant_id, cooperative_id).await? {
                if existing.analyzed_at.date_naive() == Utc::now().date_naive() {
                    return Ok(existing);
                }
            }
        }

        let now = Utc::now();
        let (name, profile) = self
            .load_profile(tenant_id, cooperative_id, now.date_naive())
            .await?;
        let result = self.scorer.score(&profile);

        self.store(tenant_id, cooperative_id, name, now, result).await
    }

    /// Newest stored analysis, computing and storing one when none exists
    pub async fn latest_analysis(
        &self,
        tenant_id: Uuid,
        cooperative_id: Uuid,
    ) -> AppResult<SourcingAnalysis> {
        match self.latest_stored(tenant_id, cooperative_id).await? {
            Some(analysis) => Ok(analysis),
            None => {
                self.analyze(tenant_id, cooperative_id, AnalyzeCooperativeInput::default())
                    .await
            }
        }
    }

    async fn load_profile(
        &self,
        tenant_id: Uuid,
        cooperative_id: Uuid,
        snapshot_date: NaiveDate,
    ) -> AppResult<(String, CooperativeSourcingProfile)> {
        let row = sqlx::query_as::<_, CooperativeRow>(
            r#"
            SELECT name, region, altitude_m, website, certifications, quality_score,
                   operational_data, export_readiness, financial_data,
                   communication_metrics, digital_footprint
            FROM cooperatives
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(cooperative_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cooperative".to_string()))?;

        let benchmark = match row.1.as_deref() {
            Some(region) => self.regional_benchmark(tenant_id, region).await?,
            None => None,
        };
        let benchmark = benchmark.unwrap_or_else(|| {
            tracing::debug!(
                cooperative_id = %cooperative_id,
                "No regional FOB benchmark, using configured default"
            );
            self.default_benchmark_usd_per_kg
        });

        Ok(profile_from_row(row, benchmark, snapshot_date)?)
    }

    async fn regional_benchmark(&self, tenant_id: Uuid, region: &str) -> AppResult<Option<Decimal>> {
        let value = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT avg_fob_price_usd_per_kg FROM regions WHERE tenant_id = $1 AND LOWER(name) = LOWER($2)",
        )
        .bind(tenant_id)
        .bind(region.trim())
        .fetch_optional(&self.db)
        .await?
        .flatten();

        Ok(value.filter(|v| *v > Decimal::ZERO))
    }

    async fn latest_stored(
        &self,
        tenant_id: Uuid,
        cooperative_id: Uuid,
    ) -> AppResult<Option<SourcingAnalysis>> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>, serde_json::Value, String)>(
            r#"
            SELECT a.id, a.analyzed_at, a.result, c.name
            FROM sourcing_analyses a
            JOIN cooperatives c ON c.id = a.cooperative_id
            WHERE a.tenant_id = $1 AND a.cooperative_id = $2
            ORDER BY a.analyzed_at DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(cooperative_id)
        .fetch_optional(&self.db)
        .await?;

        let Some((id, analyzed_at, result, cooperative_name)) = row else {
            return Ok(None);
        };

        let result: ScoringResult = serde_json::from_value(result)
            .map_err(|e| AppError::Internal(format!("Stored sourcing analysis {} unreadable: {}", id, e)))?;

        Ok(Some(SourcingAnalysis {
            id,
            cooperative_id,
            cooperative_name,
            analyzed_at,
            result,
        }))
    }

    async fn store(
        &self,
        tenant_id: Uuid,
        cooperative_id: Uuid,
        cooperative_name: String,
        analyzed_at: DateTime<Utc>,
        result: ScoringResult,
    ) -> AppResult<SourcingAnalysis> {
        let encoded = serde_json::to_value(&result)
            .map_err(|e| AppError::Internal(format!("Failed to encode scoring result: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO sourcing_analyses
                (tenant_id, cooperative_id, analyzed_at, total_score, risk_score, recommendation, result)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(cooperative_id)
        .bind(analyzed_at)
        .bind(result.total_score)
        .bind(result.risk_score)
        .bind(result.recommendation.as_str())
        .bind(&encoded)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE cooperatives
            SET sourcing_scores = $3, last_scored_at = $4, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(cooperative_id)
        .bind(tenant_id)
        .bind(&encoded)
        .bind(analyzed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            cooperative_id = %cooperative_id,
            total_score = %result.total_score,
            risk_score = %result.risk_score,
            recommendation = %result.recommendation,
            "Sourcing analysis stored"
        );

        Ok(SourcingAnalysis {
            id,
            cooperative_id,
            cooperative_name,
            analyzed_at,
            result,
        })
    }
}
