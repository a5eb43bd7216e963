//! Sourcing regions and their FOB price benchmarks
//!
//! The benchmark feeds the price competitiveness score of cooperatives in
//! that region. Names are matched case-insensitively per tenant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{validate_positive, ValidationError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Region, RegionSeedSummary, UpsertRegionInput};

/// Upper bound accepted for a regional FOB price
pub const MAX_FOB_USD_PER_KG: i64 = 1000;

/// Built-in Peruvian coffee regions with their average FOB prices (USD/kg)
pub fn peru_region_benchmarks() -> Vec<(&'static str, Decimal)> {
    vec![
        ("Cajamarca", Decimal::new(530, 2)),
        ("Junín", Decimal::new(510, 2)),
        ("San Martín", Decimal::new(490, 2)),
        ("Cusco", Decimal::new(560, 2)),
        ("Amazonas", Decimal::new(550, 2)),
        ("Puno", Decimal::new(570, 2)),
    ]
}

/// Trim and check a region upsert, returning the name and benchmark to store
pub fn validate_region(input: UpsertRegionInput) -> Result<(String, Option<Decimal>), ValidationError> {
    let mut errors = ValidationError::new();

    let name = input.name.trim().to_string();
    if name.is_empty() {
        errors.push_code("name", "required", "name is required");
    } else if name.chars().count() > 255 {
        errors.push("name", "name must be at most 255 characters");
    }

    if let Some(price) = input.avg_fob_price_usd_per_kg {
        errors.check("avg_fob_price_usd_per_kg", validate_positive(price));
        if price > Decimal::from(MAX_FOB_USD_PER_KG) {
            errors.push(
                "avg_fob_price_usd_per_kg",
                format!("Price must be at most {} USD/kg", MAX_FOB_USD_PER_KG),
            );
        }
    }

    errors.into_result()?;
    Ok((name, input.avg_fob_price_usd_per_kg))
}

type RegionRow = (Uuid, String, Option<Decimal>, DateTime<Utc>);

/// Region row plus whether the upsert inserted it
type UpsertedRow = (Uuid, String, Option<Decimal>, DateTime<Utc>, bool);

fn region_from_row((id, name, avg_fob_price_usd_per_kg, updated_at): RegionRow) -> Region {
    Region {
        id,
        name,
        avg_fob_price_usd_per_kg,
        updated_at,
    }
}

const UPSERT_REGION: &str = r#"
    INSERT INTO regions (tenant_id, name, avg_fob_price_usd_per_kg)
    VALUES ($1, $2, $3)
    ON CONFLICT (tenant_id, LOWER(name)) DO UPDATE SET
        avg_fob_price_usd_per_kg = EXCLUDED.avg_fob_price_usd_per_kg,
        updated_at = NOW()
    RETURNING id, name, avg_fob_price_usd_per_kg, updated_at, (xmax = 0) AS inserted
"#;

#[derive(Clone)]
pub struct RegionService {
    db: PgPool,
}

impl RegionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All regions of a tenant, alphabetically
    pub async fn list(&self, tenant_id: Uuid) -> AppResult<Vec<Region>> {
        let rows = sqlx::query_as::<_, RegionRow>(
            r#"
            SELECT id, name, avg_fob_price_usd_per_kg, updated_at
            FROM regions
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(region_from_row).collect())
    }

    /// Create a region or replace the benchmark of an existing one
    pub async fn upsert(&self, tenant_id: Uuid, input: UpsertRegionInput) -> AppResult<Region> {
        let (name, price) = validate_region(input)?;

        let (id, name, price, updated_at, inserted) = sqlx::query_as::<_, UpsertedRow>(UPSERT_REGION)
            .bind(tenant_id)
            .bind(&name)
            .bind(price)
            .fetch_one(&self.db)
            .await?;

        tracing::info!(
            region = %name,
            avg_fob_price_usd_per_kg = ?price,
            inserted,
            "Region benchmark stored"
        );
        Ok(region_from_row((id, name, price, updated_at)))
    }

    /// Store the built-in Peruvian region benchmarks for a tenant
    pub async fn seed(&self, tenant_id: Uuid) -> AppResult<RegionSeedSummary> {
        let benchmarks = peru_region_benchmarks();
        let mut summary = RegionSeedSummary {
            created: 0,
            updated: 0,
            total: benchmarks.len(),
        };

        let mut tx = self.db.begin().await?;
        for (name, price) in benchmarks {
            let (_, _, _, _, inserted) = sqlx::query_as::<_, UpsertedRow>(UPSERT_REGION)
                .bind(tenant_id)
                .bind(name)
                .bind(Some(price))
                .fetch_one(&mut *tx)
                .await?;

            if inserted {
                summary.created += 1;
            } else {
                summary.updated += 1;
            }
        }
        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant_id,
            created = summary.created,
            updated = summary.updated,
            "Region benchmarks seeded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, price: Option<Decimal>) -> UpsertRegionInput {
        UpsertRegionInput {
            name: name.to_string(),
            avg_fob_price_usd_per_kg: price,
        }
    }

    #[test]
    fn test_seed_table_is_usable_as_benchmarks() {
        let benchmarks = peru_region_benchmarks();
        assert_eq!(benchmarks.len(), 6);
        for (name, price) in &benchmarks {
            assert!(validate_region(input(name, Some(*price))).is_ok(), "{}", name);
        }

        let mut names: Vec<String> = benchmarks.iter().map(|(n, _)| n.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), benchmarks.len());
        assert!(benchmarks.contains(&("Junín", Decimal::new(510, 2))));
    }

    #[test]
    fn test_name_is_trimmed() {
        let (name, price) = validate_region(input("  Cajamarca ", None)).unwrap();
        assert_eq!(name, "Cajamarca");
        assert_eq!(price, None);
    }

    #[test]
    fn test_blank_name_and_bad_price_reported_together() {
        let err = validate_region(input(" ", Some(Decimal::ZERO))).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("avg_fob_price_usd_per_kg"));
    }

    #[test]
    fn test_price_ceiling() {
        assert!(validate_region(input("Puno", Some(Decimal::from(MAX_FOB_USD_PER_KG)))).is_ok());
        let err = validate_region(input("Puno", Some(Decimal::from(MAX_FOB_USD_PER_KG + 1)))).unwrap_err();
        assert!(err.has_field("avg_fob_price_usd_per_kg"));
    }
}
