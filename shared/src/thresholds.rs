//! Tunable thresholds for cooperative sourcing scores
//!
//! Every bucket edge, point value and weight used by the scoring engine and
//! the recommendation classifier lives here. The defaults reproduce the
//! production calibration; the backend can override any of them from its
//! configuration without touching the scoring control flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

// ============================================================================
// Tier Tables
// ============================================================================

/// How a tier threshold is compared against the measured value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// value >= threshold
    AtLeast,
    /// value <= threshold
    AtMost,
    /// value < threshold
    Below,
    /// value > threshold
    Above,
}

impl Comparison {
    fn matches(&self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            Comparison::AtLeast => value >= threshold,
            Comparison::AtMost => value <= threshold,
            Comparison::Below => value < threshold,
            Comparison::Above => value > threshold,
        }
    }
}

/// One bucket of a tier table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: Decimal,
    pub points: Decimal,
}

/// Ordered bucket lookup; the first matching tier wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub comparison: Comparison,
    pub tiers: Vec<Tier>,
    /// Points when no tier matches
    pub otherwise: Decimal,
}

impl TierTable {
    fn new(comparison: Comparison, tiers: &[(i64, i64)], otherwise: i64) -> Self {
        Self {
            comparison,
            tiers: tiers
                .iter()
                .map(|&(threshold, points)| Tier {
                    threshold: d(threshold),
                    points: d(points),
                })
                .collect(),
            otherwise: d(otherwise),
        }
    }

    /// Index of the first tier `value` falls into
    pub fn matching_tier(&self, value: Decimal) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| self.comparison.matches(value, tier.threshold))
    }

    pub fn points(&self, value: Decimal) -> Decimal {
        self.matching_tier(value)
            .map(|index| self.tiers[index].points)
            .unwrap_or(self.otherwise)
    }

    /// Threshold of the tier at `index`, if the table has one
    pub fn threshold(&self, index: usize) -> Option<Decimal> {
        self.tiers.get(index).map(|tier| tier.threshold)
    }

    /// Highest points this table can award
    pub fn max_points(&self) -> Decimal {
        self.tiers
            .iter()
            .map(|tier| tier.points)
            .fold(self.otherwise, Decimal::max)
    }
}

// ============================================================================
// Sub-score Rules
// ============================================================================

/// Supply capacity: volume 30, farmers 20, storage 20, processing 15, experience 15
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyCapacityRules {
    pub export_volume_kg: TierTable,
    pub farmer_count: TierTable,
    pub storage_capacity_kg: TierTable,
    pub wet_mill_points: Decimal,
    pub dry_mill_points: Decimal,
    pub export_experience_years: TierTable,
}

impl Default for SupplyCapacityRules {
    fn default() -> Self {
        Self {
            export_volume_kg: TierTable::new(
                Comparison::AtLeast,
                &[(100_000, 30), (50_000, 25), (25_000, 20), (10_000, 15)],
                5,
            ),
            farmer_count: TierTable::new(
                Comparison::AtLeast,
                &[(500, 20), (200, 17), (100, 14), (50, 10)],
                5,
            ),
            storage_capacity_kg: TierTable::new(
                Comparison::AtLeast,
                &[(200_000, 20), (100_000, 17), (50_000, 14), (25_000, 10)],
                5,
            ),
            wet_mill_points: d(8),
            dry_mill_points: d(7),
            export_experience_years: TierTable::new(
                Comparison::AtLeast,
                &[(10, 15), (5, 12), (3, 9), (1, 6)],
                2,
            ),
        }
    }
}

/// Export readiness: license 25, SENASA 25, certifications 25, customs 15, coordinator 10
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportReadinessRules {
    pub license_points: Decimal,
    pub senasa_points: Decimal,
    pub certification_count: TierTable,
    pub customs_issues: TierTable,
    pub document_coordinator_points: Decimal,
}

impl Default for ExportReadinessRules {
    fn default() -> Self {
        Self {
            license_points: d(25),
            senasa_points: d(25),
            certification_count: TierTable::new(
                Comparison::AtLeast,
                &[(3, 25), (2, 20), (1, 15)],
                5,
            ),
            customs_issues: TierTable::new(Comparison::AtMost, &[(0, 15), (2, 10), (5, 5)], 0),
            document_coordinator_points: d(10),
        }
    }
}

/// Communication: response 25, languages 25, digital 20, documentation 15, meetings 15
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationRules {
    pub response_time_hours: TierTable,
    pub english_points: Decimal,
    pub german_points: Decimal,
    pub language_cap: Decimal,
    /// Awarded when neither English nor German is spoken
    pub spanish_only_points: Decimal,
    pub website_points: Decimal,
    pub facebook_points: Decimal,
    pub instagram_points: Decimal,
    pub whatsapp_points: Decimal,
    pub photos_points: Decimal,
    pub cupping_scores_points: Decimal,
    pub missed_meetings: TierTable,
}

impl Default for CommunicationRules {
    fn default() -> Self {
        Self {
            response_time_hours: TierTable::new(
                Comparison::AtMost,
                &[(24, 25), (48, 20), (72, 10)],
                0,
            ),
            english_points: d(15),
            german_points: d(10),
            language_cap: d(25),
            spanish_only_points: d(5),
            website_points: d(8),
            facebook_points: d(4),
            instagram_points: d(4),
            whatsapp_points: d(4),
            photos_points: d(8),
            cupping_scores_points: d(7),
            missed_meetings: TierTable::new(Comparison::AtMost, &[(0, 15), (1, 12), (3, 8)], 3),
        }
    }
}

/// Price competitiveness: `100 - |difference_pct| * penalty_per_pct`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceBenchmarkRules {
    pub penalty_per_pct: Decimal,
    /// Score when either price is unknown
    pub neutral_score: Decimal,
}

impl Default for PriceBenchmarkRules {
    fn default() -> Self {
        Self {
            penalty_per_pct: d(2),
            neutral_score: d(50),
        }
    }
}

/// Altitude bands for geographic risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeographicRiskRules {
    pub extreme_below_m: Decimal,
    pub extreme_above_m: Decimal,
    pub marginal_below_m: Decimal,
    pub marginal_above_m: Decimal,
    pub extreme_points: Decimal,
    pub marginal_points: Decimal,
    pub optimal_points: Decimal,
}

impl Default for GeographicRiskRules {
    fn default() -> Self {
        Self {
            extreme_below_m: d(800),
            extreme_above_m: d(2200),
            marginal_below_m: d(1000),
            marginal_above_m: d(2000),
            extreme_points: d(12),
            marginal_points: d(6),
            optimal_points: d(2),
        }
    }
}

/// Risk components (lower is better): financial 25, quality 20, delivery 25,
/// geographic 15, communication 15
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    pub annual_revenue_usd: TierTable,
    pub quality_score: TierTable,
    pub export_experience_years: TierTable,
    pub customs_issues: TierTable,
    pub geographic: GeographicRiskRules,
    pub response_time_hours: TierTable,
    pub missed_meetings: TierTable,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            annual_revenue_usd: TierTable::new(
                Comparison::Below,
                &[(100_000, 25), (300_000, 15), (500_000, 8)],
                2,
            ),
            quality_score: TierTable::new(Comparison::Below, &[(60, 20), (75, 12), (85, 6)], 2),
            export_experience_years: TierTable::new(Comparison::Below, &[(2, 15), (5, 8)], 0),
            customs_issues: TierTable::new(Comparison::Above, &[(3, 10), (0, 5)], 0),
            geographic: GeographicRiskRules::default(),
            response_time_hours: TierTable::new(Comparison::Above, &[(72, 8), (48, 4)], 0),
            missed_meetings: TierTable::new(Comparison::Above, &[(2, 7), (0, 3)], 0),
        }
    }
}

// ============================================================================
// Weights and Recommendation Thresholds
// ============================================================================

/// Weights of the total score; must be non-negative and sum to 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub supply_capacity: Decimal,
    pub quality_track_record: Decimal,
    pub export_readiness: Decimal,
    pub price_competitiveness: Decimal,
    pub communication: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            supply_capacity: Decimal::new(30, 2),
            quality_track_record: Decimal::new(25, 2),
            export_readiness: Decimal::new(20, 2),
            price_competitiveness: Decimal::new(15, 2),
            communication: Decimal::new(10, 2),
        }
    }
}

impl ScoreWeights {
    fn named(&self) -> [(&'static str, Decimal); 5] {
        [
            ("weights.supply_capacity", self.supply_capacity),
            ("weights.quality_track_record", self.quality_track_record),
            ("weights.export_readiness", self.export_readiness),
            ("weights.price_competitiveness", self.price_competitiveness),
            ("weights.communication", self.communication),
        ]
    }

    pub fn sum(&self) -> Decimal {
        self.named().iter().map(|(_, w)| *w).sum()
    }
}

/// Score/risk gates for the recommendation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub highly_recommended_min_score: Decimal,
    pub highly_recommended_max_risk: Decimal,
    pub recommended_min_score: Decimal,
    pub recommended_max_risk: Decimal,
    pub caution_min_score: Decimal,
    pub caution_max_risk: Decimal,
    /// Scores below this are not recommended
    pub rejection_score_below: Decimal,
    /// Risk at or above this is not recommended
    pub rejection_risk_at_least: Decimal,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            highly_recommended_min_score: d(80),
            highly_recommended_max_risk: d(30),
            recommended_min_score: d(70),
            recommended_max_risk: d(40),
            caution_min_score: d(60),
            caution_max_risk: d(50),
            rejection_score_below: d(60),
            rejection_risk_at_least: d(60),
        }
    }
}

// ============================================================================
// Scoring Configuration
// ============================================================================

/// Complete scoring calibration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub supply: SupplyCapacityRules,
    pub export: ExportReadinessRules,
    pub communication: CommunicationRules,
    pub price: PriceBenchmarkRules,
    pub risk: RiskRules,
    pub recommendation: RecommendationThresholds,
    /// Quality track record assumed when a cooperative has none on file
    pub default_quality_score: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            supply: SupplyCapacityRules::default(),
            export: ExportReadinessRules::default(),
            communication: CommunicationRules::default(),
            price: PriceBenchmarkRules::default(),
            risk: RiskRules::default(),
            recommendation: RecommendationThresholds::default(),
            default_quality_score: d(50),
        }
    }
}

impl ScoringConfig {
    /// Reject calibrations the engine cannot use
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        for (field, weight) in self.weights.named() {
            if weight < Decimal::ZERO {
                errors.push(field, "Weight cannot be negative");
            }
        }
        if self.weights.sum() != Decimal::ONE {
            errors.push("weights", format!("Weights must sum to 1, got {}", self.weights.sum()));
        }

        let score = self.default_quality_score;
        if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
            errors.push("default_quality_score", "Score must be between 0 and 100");
        }
        if self.price.penalty_per_pct < Decimal::ZERO {
            errors.push("price.penalty_per_pct", "Value cannot be negative");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
        assert_eq!(ScoreWeights::default().sum(), Decimal::ONE);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.weights.communication = Decimal::new(20, 2);
        let err = config.validate().unwrap_err();
        assert!(err.has_field("weights"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.communication = Decimal::new(-10, 2);
        config.weights.supply_capacity = Decimal::new(50, 2);
        let err = config.validate().unwrap_err();
        assert!(err.has_field("weights.communication"));
    }

    #[test]
    fn test_tier_table_at_least() {
        let table = SupplyCapacityRules::default().farmer_count;
        assert_eq!(table.points(d(1000)), d(20));
        assert_eq!(table.points(d(500)), d(20));
        assert_eq!(table.points(d(499)), d(17));
        assert_eq!(table.points(d(50)), d(10));
        assert_eq!(table.points(d(49)), d(5));
        assert_eq!(table.max_points(), d(20));
    }

    #[test]
    fn test_tier_table_at_most() {
        let table = CommunicationRules::default().response_time_hours;
        assert_eq!(table.points(d(24)), d(25));
        assert_eq!(table.points(d(25)), d(20));
        assert_eq!(table.points(d(72)), d(10));
        assert_eq!(table.points(d(73)), d(0));
    }

    #[test]
    fn test_tier_table_below_and_above() {
        let rules = RiskRules::default();
        assert_eq!(rules.annual_revenue_usd.points(d(99_999)), d(25));
        assert_eq!(rules.annual_revenue_usd.points(d(100_000)), d(15));
        assert_eq!(rules.annual_revenue_usd.points(d(600_000)), d(2));

        assert_eq!(rules.customs_issues.points(d(0)), d(0));
        assert_eq!(rules.customs_issues.points(d(3)), d(5));
        assert_eq!(rules.customs_issues.points(d(4)), d(10));
        assert_eq!(rules.customs_issues.matching_tier(d(4)), Some(0));
        assert_eq!(rules.customs_issues.matching_tier(d(0)), None);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"recommendation": {"highly_recommended_min_score": "85"}}"#).unwrap();
        assert_eq!(config.recommendation.highly_recommended_min_score, d(85));
        assert_eq!(config.recommendation.recommended_min_score, d(70));
        assert_eq!(config.weights, ScoreWeights::default());
        assert_eq!(config.default_quality_score, d(50));
    }
}
