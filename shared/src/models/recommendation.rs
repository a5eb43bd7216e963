//! Sourcing recommendation classifier

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::thresholds::RecommendationThresholds;

/// Sourcing recommendation for a cooperative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    ConsiderWithCaution,
    NotRecommended,
    MonitorClosely,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HighlyRecommended => "HIGHLY_RECOMMENDED",
            Recommendation::Recommended => "RECOMMENDED",
            Recommendation::ConsiderWithCaution => "CONSIDER_WITH_CAUTION",
            Recommendation::NotRecommended => "NOT_RECOMMENDED",
            Recommendation::MonitorClosely => "MONITOR_CLOSELY",
        }
    }

    /// Accepts both `HIGHLY_RECOMMENDED` and the legacy `HIGHLY RECOMMENDED`
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().replace(' ', "_").as_str() {
            "HIGHLY_RECOMMENDED" => Some(Recommendation::HighlyRecommended),
            "RECOMMENDED" => Some(Recommendation::Recommended),
            "CONSIDER_WITH_CAUTION" => Some(Recommendation::ConsiderWithCaution),
            "NOT_RECOMMENDED" => Some(Recommendation::NotRecommended),
            "MONITOR_CLOSELY" => Some(Recommendation::MonitorClosely),
            _ => None,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify with the default thresholds
pub fn classify(total_score: Decimal, risk_score: Decimal) -> Recommendation {
    classify_with(total_score, risk_score, &RecommendationThresholds::default())
}

/// Ordered rule ladder; the first matching rule wins
pub fn classify_with(
    total_score: Decimal,
    risk_score: Decimal,
    thresholds: &RecommendationThresholds,
) -> Recommendation {
    if total_score >= thresholds.highly_recommended_min_score
        && risk_score < thresholds.highly_recommended_max_risk
    {
        return Recommendation::HighlyRecommended;
    }

    if total_score >= thresholds.recommended_min_score && risk_score < thresholds.recommended_max_risk {
        return Recommendation::Recommended;
    }

    if total_score >= thresholds.caution_min_score && risk_score < thresholds.caution_max_risk {
        return Recommendation::ConsiderWithCaution;
    }

    if total_score < thresholds.rejection_score_below || risk_score >= thresholds.rejection_risk_at_least {
        return Recommendation::NotRecommended;
    }

    Recommendation::MonitorClosely
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_risk_tier_flips_same_score() {
        assert_eq!(classify(d(85), d(25)), Recommendation::HighlyRecommended);
        assert_eq!(classify(d(85), d(35)), Recommendation::Recommended);
    }

    #[test]
    fn test_each_rung() {
        assert_eq!(classify(d(72), d(39)), Recommendation::Recommended);
        assert_eq!(classify(d(65), d(45)), Recommendation::ConsiderWithCaution);
        assert_eq!(classify(d(59), d(0)), Recommendation::NotRecommended);
        assert_eq!(classify(d(95), d(60)), Recommendation::NotRecommended);
        assert_eq!(classify(d(65), d(55)), Recommendation::MonitorClosely);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RecommendationThresholds {
            highly_recommended_min_score: d(90),
            ..RecommendationThresholds::default()
        };
        assert_eq!(classify_with(d(85), d(25), &thresholds), Recommendation::Recommended);
    }

    #[test]
    fn test_serialized_form() {
        assert_eq!(
            serde_json::to_string(&Recommendation::ConsiderWithCaution).unwrap(),
            "\"CONSIDER_WITH_CAUTION\""
        );
        assert_eq!(
            Recommendation::from_str("highly recommended"),
            Some(Recommendation::HighlyRecommended)
        );
        assert_eq!(Recommendation::from_str("maybe"), None);
    }
}
