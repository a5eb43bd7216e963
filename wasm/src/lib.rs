//! WebAssembly module for the CoffeeStudio calculators
//!
//! Lets the browser run the margin, landed cost and sourcing calculators
//! offline. Every entry point takes and returns JSON; failures come back as
//! the same `{"errors": [...]}` body the validation layer produces.

use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::{
    calculate_landed_cost, calculate_margin, classify, CooperativeProfileData,
    CooperativeSourcingProfile, FxRates, LandedCostInput, LandedCostRequest, MarginCalcInput,
    MarginCalcRequest, ScoringConfig, SourcingScorer, ValidationError,
};

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn validation_json(err: ValidationError) -> String {
    serde_json::to_string(&err).unwrap_or_else(|_| err.to_string())
}

fn parse_body<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json)
        .map_err(|e| validation_json(ValidationError::single("body", format!("Invalid JSON: {}", e))))
}

fn fx_rates(default_usd_to_eur: Option<f64>) -> Result<FxRates, String> {
    match default_usd_to_eur {
        None => Ok(FxRates::default()),
        Some(rate) => Decimal::try_from(rate)
            .ok()
            .filter(|r| *r > Decimal::ZERO)
            .map(FxRates::new)
            .ok_or_else(|| {
                validation_json(ValidationError::single(
                    "default_usd_to_eur",
                    "must be greater than zero",
                ))
            }),
    }
}

// ============================================================================
// JSON Entry Points
// ============================================================================

/// Margin calculation over a `MarginCalcRequest` JSON body
pub fn margin_json(request_json: &str) -> Result<String, String> {
    let request: MarginCalcRequest = parse_body(request_json)?;
    let input = MarginCalcInput::parse(request, &FxRates::default()).map_err(validation_json)?;
    to_json(&calculate_margin(&input))
}

/// Landed cost over a `LandedCostRequest` JSON body
pub fn landed_cost_json(request_json: &str, default_usd_to_eur: Option<f64>) -> Result<String, String> {
    let request: LandedCostRequest = parse_body(request_json)?;
    let fx = fx_rates(default_usd_to_eur)?;
    let input = LandedCostInput::parse(request, &fx).map_err(validation_json)?;
    to_json(&calculate_landed_cost(&input))
}

/// Score a cooperative snapshot, optionally with a custom calibration
///
/// The profile must carry `snapshot_date`; license expiry is judged against it.
pub fn score_json(profile_json: &str, config_json: Option<&str>) -> Result<String, String> {
    let data: CooperativeProfileData = parse_body(profile_json)?;
    let config = match config_json {
        Some(json) => {
            let config: ScoringConfig = parse_body(json)?;
            config
                .validate()
                .map_err(|e| validation_json(ValidationError::single("config", e.to_string())))?;
            config
        }
        None => ScoringConfig::default(),
    };

    let profile = CooperativeSourcingProfile::parse(data).map_err(validation_json)?;
    to_json(&SourcingScorer::new(config).score(&profile))
}

// ============================================================================
// Browser Bindings
// ============================================================================

/// Calculate margin; returns a `MarginCalcResult` JSON string
#[wasm_bindgen]
pub fn calculate_margin_js(request_json: &str) -> Result<String, JsValue> {
    margin_json(request_json).map_err(|e| JsValue::from_str(&e))
}

/// Calculate landed cost; returns a `LandedCostResult` JSON string
#[wasm_bindgen]
pub fn calculate_landed_cost_js(
    request_json: &str,
    default_usd_to_eur: Option<f64>,
) -> Result<String, JsValue> {
    landed_cost_json(request_json, default_usd_to_eur).map_err(|e| JsValue::from_str(&e))
}

/// Score a cooperative; returns a `ScoringResult` JSON string
#[wasm_bindgen]
pub fn score_cooperative_js(profile_json: &str, config_json: Option<String>) -> Result<String, JsValue> {
    score_json(profile_json, config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Recommendation label for a total and risk score, using default thresholds
#[wasm_bindgen]
pub fn classify_recommendation(total_score: f64, risk_score: f64) -> String {
    let total = Decimal::try_from(total_score).unwrap_or(Decimal::ZERO);
    let risk = Decimal::try_from(risk_score).unwrap_or(Decimal::ONE_HUNDRED);
    classify(total, risk).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_classify_recommendation() {
        assert_eq!(classify_recommendation(85.0, 25.0), "HIGHLY_RECOMMENDED");
        assert_eq!(classify_recommendation(85.0, 35.0), "RECOMMENDED");
        assert_eq!(classify_recommendation(40.0, 10.0), "NOT_RECOMMENDED");
    }

    #[test]
    fn test_margin_json() {
        let body = r#"{
            "purchase_price_per_kg": 5.0,
            "landed_costs_per_kg": 1.0,
            "roast_and_pack_costs_per_kg": 2.0,
            "yield_factor": 0.8,
            "selling_price_per_kg": 13.1034,
            "purchase_currency": "USD",
            "selling_currency": "USD"
        }"#;
        let result: Value = serde_json::from_str(&margin_json(body).unwrap()).unwrap();
        let pct = result["outputs"]["margin_pct"].as_f64().unwrap();
        assert!((pct - 27.5).abs() < 0.01);
    }

    #[test]
    fn test_margin_json_zero_yield() {
        let err = margin_json(r#"{"purchase_price_per_kg": 5, "selling_price_per_kg": 10, "yield_factor": 0}"#)
            .unwrap_err();
        let body: Value = serde_json::from_str(&err).unwrap();
        assert_eq!(body["errors"][0]["field"], "yield_factor");
    }

    #[test]
    fn test_landed_cost_json() {
        let body = r#"{
            "weight_kg": 1000, "green_price_usd_per_kg": 4.0, "incoterm": "FOB",
            "freight_usd": 500, "insurance_pct": 1, "handling_eur": 50,
            "inland_trucking_eur": 100, "duty_pct": 10, "vat_pct": 18
        }"#;
        let result: Value = serde_json::from_str(&landed_cost_json(body, None).unwrap()).unwrap();
        let total = result["total_landed_cost"].as_f64().unwrap();
        assert!((total - 6042.92).abs() < 1e-6);
    }

    #[test]
    fn test_landed_cost_overflow_is_a_validation_error() {
        let body = r#"{"weight_kg": "100000000000000000000", "green_price_usd_per_kg": "10000000000"}"#;
        let err = landed_cost_json(body, None).unwrap_err();
        let body: Value = serde_json::from_str(&err).unwrap();
        assert_eq!(body["errors"][0]["field"], "weight_kg");
        assert_eq!(body["errors"][0]["code"], "out_of_range");
    }

    #[test]
    fn test_landed_cost_rejects_non_positive_default_rate() {
        assert!(landed_cost_json(r#"{"weight_kg": 1, "green_price_usd_per_kg": 1}"#, Some(0.0)).is_err());
    }

    #[test]
    fn test_score_json_empty_profile() {
        let profile = r#"{"snapshot_date": "2026-10-01"}"#;
        let result: Value = serde_json::from_str(&score_json(profile, None).unwrap()).unwrap();
        assert_eq!(result["recommendation"], "NOT_RECOMMENDED");
        assert!(result["risk_score"].as_f64().unwrap() > 60.0);
    }

    #[test]
    fn test_score_json_rejects_bad_weights() {
        let config = r#"{"weights": {"supply_capacity": 0.9}}"#;
        assert!(score_json(r#"{"snapshot_date": "2026-10-01"}"#, Some(config)).is_err());
    }

    #[test]
    fn test_score_json_requires_snapshot_date() {
        let err = score_json("{}", None).unwrap_err();
        assert!(err.contains("snapshot_date"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = margin_json("not json").unwrap_err();
        assert!(err.contains("body"));
    }
}
