//! Cooperative sourcing profile and scoring engine
//!
//! A cooperative is scored from a read-only snapshot of its operational,
//! export, financial and communication records. Sub-scores are bucketed
//! through the tier tables of [`ScoringConfig`]; the weighted total and the
//! risk score feed the recommendation classifier.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::invariant::{difference, product, quotient, validated, Fault};
use crate::models::recommendation::{classify_with, Recommendation};
use crate::thresholds::ScoringConfig;
use crate::validation::{validate_count, validate_non_negative, validate_positive, validate_score};

// ============================================================================
// Profile Records
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalData {
    pub farmer_count: i64,
    pub storage_capacity_kg: Decimal,
    pub has_wet_mill: bool,
    pub has_dry_mill: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportReadinessData {
    pub export_license_number: Option<String>,
    pub export_license_expiry: Option<NaiveDate>,
    /// Registered with SENASA, Peru's agricultural health authority
    pub senasa_registered: bool,
    pub customs_clearance_issues_count: i64,
    pub has_document_coordinator: bool,
    pub export_experience_years: Decimal,
    pub containers_exported_lifetime: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialData {
    pub export_volume_kg_last_year: Decimal,
    pub annual_revenue_usd: Decimal,
    /// Zero or absent means not reported
    pub avg_price_achieved_usd_per_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationMetrics {
    /// Absent means the cooperative has not been reachable
    pub avg_email_response_time_hours: Option<Decimal>,
    pub languages_spoken: Vec<String>,
    pub whatsapp_business: bool,
    pub provides_photos_regularly: bool,
    pub provides_cupping_scores: bool,
    pub missed_meetings_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalFootprint {
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
}

/// Unvalidated cooperative snapshot, as stored or received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooperativeProfileData {
    pub operational_data: OperationalData,
    pub export_readiness: ExportReadinessData,
    pub financial_data: FinancialData,
    pub communication_metrics: CommunicationMetrics,
    pub digital_footprint: DigitalFootprint,
    pub certifications: Vec<String>,
    pub altitude_m: Option<Decimal>,
    /// Externally assessed quality track record, 0-100
    pub quality_score: Option<Decimal>,
    pub regional_benchmark_usd_per_kg: Option<Decimal>,
    /// Date against which license expiry is judged
    pub snapshot_date: Option<NaiveDate>,
}

/// Validated cooperative snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooperativeSourcingProfile {
    data: CooperativeProfileData,
    snapshot_date: NaiveDate,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl CooperativeSourcingProfile {
    pub fn parse(data: CooperativeProfileData) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();

        let ops = &data.operational_data;
        errors.check("operational_data.farmer_count", validate_count(ops.farmer_count));
        errors.check(
            "operational_data.storage_capacity_kg",
            validate_non_negative(ops.storage_capacity_kg),
        );

        let export = &data.export_readiness;
        errors.check(
            "export_readiness.customs_clearance_issues_count",
            validate_count(export.customs_clearance_issues_count),
        );
        errors.check(
            "export_readiness.export_experience_years",
            validate_non_negative(export.export_experience_years),
        );
        errors.check(
            "export_readiness.containers_exported_lifetime",
            validate_count(export.containers_exported_lifetime),
        );

        let financial = &data.financial_data;
        errors.check(
            "financial_data.export_volume_kg_last_year",
            validate_non_negative(financial.export_volume_kg_last_year),
        );
        errors.check(
            "financial_data.annual_revenue_usd",
            validate_non_negative(financial.annual_revenue_usd),
        );
        if let Some(price) = financial.avg_price_achieved_usd_per_kg {
            errors.check(
                "financial_data.avg_price_achieved_usd_per_kg",
                validate_non_negative(price),
            );
        }

        let comm = &data.communication_metrics;
        if let Some(hours) = comm.avg_email_response_time_hours {
            errors.check(
                "communication_metrics.avg_email_response_time_hours",
                validate_non_negative(hours),
            );
        }
        errors.check(
            "communication_metrics.missed_meetings_count",
            validate_count(comm.missed_meetings_count),
        );

        if let Some(altitude) = data.altitude_m {
            errors.check("altitude_m", validate_non_negative(altitude));
        }
        if let Some(score) = data.quality_score {
            errors.check("quality_score", validate_score(score));
        }
        if let Some(benchmark) = data.regional_benchmark_usd_per_kg {
            errors.check("regional_benchmark_usd_per_kg", validate_positive(benchmark));
        }

        let snapshot_date = errors.required("snapshot_date", data.snapshot_date);
        errors.into_result()?;
        let Some(snapshot_date) = snapshot_date else {
            return Err(ValidationError::single("snapshot_date", "Field is required"));
        };

        let price = data.financial_data.avg_price_achieved_usd_per_kg;
        if let (Some(price), Some(benchmark)) = (price, data.regional_benchmark_usd_per_kg) {
            if let Err(fault) = price_difference_pct(price, benchmark) {
                let mut errors = ValidationError::new();
                errors.push_fault(fault);
                return Err(errors);
            }
        }

        Ok(Self { data, snapshot_date })
    }

    pub fn operational_data(&self) -> &OperationalData {
        &self.data.operational_data
    }

    pub fn export_readiness(&self) -> &ExportReadinessData {
        &self.data.export_readiness
    }

    pub fn financial_data(&self) -> &FinancialData {
        &self.data.financial_data
    }

    pub fn communication_metrics(&self) -> &CommunicationMetrics {
        &self.data.communication_metrics
    }

    pub fn digital_footprint(&self) -> &DigitalFootprint {
        &self.data.digital_footprint
    }

    /// Distinct non-empty certification labels, lowercased
    pub fn certifications(&self) -> BTreeSet<String> {
        self.data
            .certifications
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Altitude in metres; unknown altitude counts as sea level
    pub fn altitude_m(&self) -> Decimal {
        self.data.altitude_m.unwrap_or(Decimal::ZERO)
    }

    pub fn quality_score(&self) -> Option<Decimal> {
        self.data.quality_score
    }

    pub fn regional_benchmark_usd_per_kg(&self) -> Option<Decimal> {
        self.data.regional_benchmark_usd_per_kg
    }

    pub fn snapshot_date(&self) -> NaiveDate {
        self.snapshot_date
    }

    /// License number on file and expiry on or after the snapshot date
    pub fn license_valid(&self) -> bool {
        let export = &self.data.export_readiness;
        present(&export.export_license_number)
            && export
                .export_license_expiry
                .is_some_and(|expiry| expiry >= self.snapshot_date)
    }

    fn speaks(&self, names: &[&str]) -> bool {
        self.data
            .communication_metrics
            .languages_spoken
            .iter()
            .any(|l| names.contains(&l.trim().to_lowercase().as_str()))
    }

    /// Response time for scoring; unreported counts as unresponsive
    fn response_hours(&self) -> Decimal {
        self.data
            .communication_metrics
            .avg_email_response_time_hours
            .unwrap_or(Decimal::MAX)
    }
}

impl TryFrom<CooperativeProfileData> for CooperativeSourcingProfile {
    type Error = ValidationError;

    fn try_from(data: CooperativeProfileData) -> Result<Self, Self::Error> {
        Self::parse(data)
    }
}

// ============================================================================
// Score Breakdowns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyCapacityBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub farmer_count_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub storage_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub processing_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub experience_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReadinessBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    pub license_valid: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub license_score: Decimal,
    pub senasa_registered: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub senasa_score: Decimal,
    pub certifications: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub certifications_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub customs_history_score: Decimal,
    pub document_coordinator: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub coordinator_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub response_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub language_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub digital_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub documentation_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub meeting_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBenchmark {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub cooperative_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub regional_benchmark: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub difference_pct: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
}

/// Risk components; lower is better
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(with = "rust_decimal::serde::float")]
    pub risk_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub financial_risk: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quality_risk: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_risk: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub geographic_risk: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub communication_risk: Decimal,
    pub risk_factors: Vec<String>,
}

/// Complete scoring of one cooperative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub supply_capacity_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub export_readiness_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub communication_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_benchmark_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub quality_track_record_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub risk_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_score: Decimal,
    pub recommendation: Recommendation,
    pub supply_capacity: SupplyCapacityBreakdown,
    pub export_readiness: ExportReadinessBreakdown,
    pub communication: CommunicationBreakdown,
    pub price_benchmark: PriceBenchmark,
    pub risk: RiskAssessment,
}

// ============================================================================
// Scoring Engine
// ============================================================================

/// Scores cooperatives against one calibration
#[derive(Debug, Clone, Default)]
pub struct SourcingScorer {
    config: ScoringConfig,
}

impl SourcingScorer {
    /// The calibration is taken as given; call [`ScoringConfig::validate`] when loading it
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, profile: &CooperativeSourcingProfile) -> ScoringResult {
        let supply_capacity = self.supply_capacity(profile);
        let export_readiness = self.export_readiness(profile);
        let communication = self.communication(profile);
        let price_benchmark = self.price_benchmark(profile);
        let risk = self.risk(profile);
        let quality = self.quality_track_record(profile);

        let weights = &self.config.weights;
        let total_score = supply_capacity.score * weights.supply_capacity
            + quality * weights.quality_track_record
            + export_readiness.score * weights.export_readiness
            + price_benchmark.score * weights.price_competitiveness
            + communication.score * weights.communication;

        let recommendation = classify_with(total_score, risk.risk_score, &self.config.recommendation);

        ScoringResult {
            supply_capacity_score: supply_capacity.score,
            export_readiness_score: export_readiness.score,
            communication_score: communication.score,
            price_benchmark_score: price_benchmark.score,
            quality_track_record_score: quality,
            risk_score: risk.risk_score,
            total_score,
            recommendation,
            supply_capacity,
            export_readiness,
            communication,
            price_benchmark,
            risk,
        }
    }

    fn quality_track_record(&self, profile: &CooperativeSourcingProfile) -> Decimal {
        profile
            .quality_score()
            .unwrap_or(self.config.default_quality_score)
    }

    pub fn supply_capacity(&self, profile: &CooperativeSourcingProfile) -> SupplyCapacityBreakdown {
        let rules = &self.config.supply;
        let ops = profile.operational_data();

        let volume_score = rules
            .export_volume_kg
            .points(profile.financial_data().export_volume_kg_last_year);
        let farmer_count_score = rules.farmer_count.points(Decimal::from(ops.farmer_count));
        let storage_score = rules.storage_capacity_kg.points(ops.storage_capacity_kg);

        let mut processing_score = Decimal::ZERO;
        if ops.has_wet_mill {
            processing_score += rules.wet_mill_points;
        }
        if ops.has_dry_mill {
            processing_score += rules.dry_mill_points;
        }

        let experience_score = rules
            .export_experience_years
            .points(profile.export_readiness().export_experience_years);

        let total = volume_score + farmer_count_score + storage_score + processing_score + experience_score;

        SupplyCapacityBreakdown {
            score: total.min(Decimal::ONE_HUNDRED),
            volume_score,
            farmer_count_score,
            storage_score,
            processing_score,
            experience_score,
        }
    }

    pub fn export_readiness(&self, profile: &CooperativeSourcingProfile) -> ExportReadinessBreakdown {
        let rules = &self.config.export;
        let export = profile.export_readiness();

        let license_valid = profile.license_valid();
        let license_score = if license_valid { rules.license_points } else { Decimal::ZERO };
        let senasa_score = if export.senasa_registered {
            rules.senasa_points
        } else {
            Decimal::ZERO
        };

        let certifications: Vec<String> = profile.certifications().into_iter().collect();
        let certifications_score = rules
            .certification_count
            .points(Decimal::from(certifications.len()));

        let customs_history_score = rules
            .customs_issues
            .points(Decimal::from(export.customs_clearance_issues_count));

        let coordinator_score = if export.has_document_coordinator {
            rules.document_coordinator_points
        } else {
            Decimal::ZERO
        };

        let total = license_score + senasa_score + certifications_score + customs_history_score + coordinator_score;

        ExportReadinessBreakdown {
            score: total.min(Decimal::ONE_HUNDRED),
            license_valid,
            license_score,
            senasa_registered: export.senasa_registered,
            senasa_score,
            certifications,
            certifications_score,
            customs_history_score,
            document_coordinator: export.has_document_coordinator,
            coordinator_score,
        }
    }

    pub fn communication(&self, profile: &CooperativeSourcingProfile) -> CommunicationBreakdown {
        let rules = &self.config.communication;
        let comm = profile.communication_metrics();
        let digital = profile.digital_footprint();

        let response_score = rules.response_time_hours.points(profile.response_hours());

        let mut language_score = Decimal::ZERO;
        if profile.speaks(&["english", "en"]) {
            language_score += rules.english_points;
        }
        if profile.speaks(&["german", "de", "deutsch"]) {
            language_score += rules.german_points;
        }
        let language_score = if language_score.is_zero() {
            rules.spanish_only_points
        } else {
            language_score.min(rules.language_cap)
        };

        let mut digital_score = Decimal::ZERO;
        if present(&digital.website) {
            digital_score += rules.website_points;
        }
        if present(&digital.facebook_url) {
            digital_score += rules.facebook_points;
        }
        if present(&digital.instagram_url) {
            digital_score += rules.instagram_points;
        }
        if comm.whatsapp_business {
            digital_score += rules.whatsapp_points;
        }

        let mut documentation_score = Decimal::ZERO;
        if comm.provides_photos_regularly {
            documentation_score += rules.photos_points;
        }
        if comm.provides_cupping_scores {
            documentation_score += rules.cupping_scores_points;
        }

        let meeting_score = rules
            .missed_meetings
            .points(Decimal::from(comm.missed_meetings_count));

        let total = response_score + language_score + digital_score + documentation_score + meeting_score;

        CommunicationBreakdown {
            score: total.min(Decimal::ONE_HUNDRED),
            response_score,
            language_score,
            digital_score,
            documentation_score,
            meeting_score,
        }
    }

    pub fn price_benchmark(&self, profile: &CooperativeSourcingProfile) -> PriceBenchmark {
        let rules = &self.config.price;
        let cooperative_price = profile
            .financial_data()
            .avg_price_achieved_usd_per_kg
            .filter(|price| !price.is_zero());
        let regional_benchmark = profile.regional_benchmark_usd_per_kg();

        let (difference_pct, score) = match (cooperative_price, regional_benchmark) {
            (Some(price), Some(benchmark)) => {
                let difference_pct = validated(price_difference_pct(price, benchmark));
                let score = difference_pct
                    .abs()
                    .checked_mul(rules.penalty_per_pct)
                    .map_or(Decimal::ZERO, |penalty| {
                        (Decimal::ONE_HUNDRED - penalty).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                    });
                (Some(difference_pct), score)
            }
            _ => (None, rules.neutral_score),
        };

        PriceBenchmark {
            cooperative_price,
            regional_benchmark,
            difference_pct,
            score,
        }
    }

    pub fn risk(&self, profile: &CooperativeSourcingProfile) -> RiskAssessment {
        let rules = &self.config.risk;
        let export = profile.export_readiness();
        let comm = profile.communication_metrics();
        let mut risk_factors = Vec::new();

        let revenue = profile.financial_data().annual_revenue_usd;
        let financial_risk = rules.annual_revenue_usd.points(revenue);
        match rules.annual_revenue_usd.matching_tier(revenue) {
            Some(0) => risk_factors.push(format!(
                "Low annual revenue (<${}k)",
                thousands(rules.annual_revenue_usd.threshold(0))
            )),
            Some(1) => risk_factors.push(format!(
                "Moderate annual revenue (${}k-${}k)",
                thousands(rules.annual_revenue_usd.threshold(0)),
                thousands(rules.annual_revenue_usd.threshold(1))
            )),
            _ => {}
        }

        let quality = self.quality_track_record(profile);
        let quality_risk = rules.quality_score.points(quality);
        match rules.quality_score.matching_tier(quality) {
            Some(0) => risk_factors.push(format!(
                "Low quality score (<{})",
                plain(rules.quality_score.threshold(0))
            )),
            Some(1) => risk_factors.push(format!(
                "Moderate quality score ({}-{})",
                plain(rules.quality_score.threshold(0)),
                plain(rules.quality_score.threshold(1))
            )),
            _ => {}
        }

        let experience = export.export_experience_years;
        let customs = export.customs_clearance_issues_count;
        let delivery_risk = rules.export_experience_years.points(experience)
            + rules.customs_issues.points(Decimal::from(customs));
        if rules.export_experience_years.matching_tier(experience) == Some(0) {
            risk_factors.push(format!(
                "Limited export experience (<{} years)",
                plain(rules.export_experience_years.threshold(0))
            ));
        }
        if rules.customs_issues.matching_tier(Decimal::from(customs)) == Some(0) {
            risk_factors.push(format!("Multiple customs issues ({})", customs));
        }

        let geo = &rules.geographic;
        let altitude = profile.altitude_m();
        let geographic_risk = if altitude > geo.extreme_above_m || altitude < geo.extreme_below_m {
            risk_factors.push("Extreme altitude (logistics challenges)".to_string());
            geo.extreme_points
        } else if altitude > geo.marginal_above_m || altitude < geo.marginal_below_m {
            geo.marginal_points
        } else {
            geo.optimal_points
        };

        let response_hours = profile.response_hours();
        let missed = comm.missed_meetings_count;
        let communication_risk = rules.response_time_hours.points(response_hours)
            + rules.missed_meetings.points(Decimal::from(missed));
        if rules.response_time_hours.matching_tier(response_hours) == Some(0) {
            risk_factors.push(format!(
                "Slow response time (>{}h)",
                plain(rules.response_time_hours.threshold(0))
            ));
        }
        if rules.missed_meetings.matching_tier(Decimal::from(missed)) == Some(0) {
            risk_factors.push(format!("Multiple missed meetings ({})", missed));
        }

        let total = financial_risk + quality_risk + delivery_risk + geographic_risk + communication_risk;

        RiskAssessment {
            risk_score: total.min(Decimal::ONE_HUNDRED),
            financial_risk,
            quality_risk,
            delivery_risk,
            geographic_risk,
            communication_risk,
            risk_factors,
        }
    }
}

/// Percentage by which a cooperative's price deviates from the regional benchmark
fn price_difference_pct(price: Decimal, benchmark: Decimal) -> Result<Decimal, Fault> {
    const PRICE_FIELD: &str = "financial_data.avg_price_achieved_usd_per_kg";
    let spread = difference(price, benchmark, PRICE_FIELD)?;
    let ratio = quotient(spread, benchmark, "regional_benchmark_usd_per_kg")?;
    product(ratio, Decimal::ONE_HUNDRED, PRICE_FIELD)
}

fn plain(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO).normalize()
}

fn thousands(value: Option<Decimal>) -> Decimal {
    (plain(value) / Decimal::ONE_THOUSAND).normalize()
}

/// Score with the default calibration
pub fn score_cooperative(profile: &CooperativeSourcingProfile) -> ScoringResult {
    SourcingScorer::default().score(profile)
}
