//! Margin calculation for a green coffee lot sold as roasted coffee

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::invariant::{difference, product, quotient, sum, validated, Fault};
use crate::models::currency::{Currency, FxRates};
use crate::validation::{
    parse_currency, validate_non_negative, validate_positive, validate_yield_factor,
};

/// Raw margin calculation request as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginCalcRequest {
    pub purchase_price_per_kg: Option<Decimal>,
    pub purchase_currency: Option<String>,
    /// Additive landed costs per kg green (freight, insurance, handling, import)
    pub landed_costs_per_kg: Option<Decimal>,
    /// Roasting and packing costs per kg roasted
    pub roast_and_pack_costs_per_kg: Option<Decimal>,
    /// Roasted weight per green weight; 0.84 means 16% roast loss
    pub yield_factor: Option<Decimal>,
    /// Selling price per kg roasted
    pub selling_price_per_kg: Option<Decimal>,
    pub selling_currency: Option<String>,
    pub fx_usd_to_eur: Option<Decimal>,
}

/// Validated margin inputs
///
/// Only obtainable through [`MarginCalcInput::parse`], so every instance
/// satisfies the calculator's preconditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginCalcInput {
    #[serde(with = "rust_decimal::serde::float")]
    purchase_price_per_kg: Decimal,
    purchase_currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    landed_costs_per_kg: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    roast_and_pack_costs_per_kg: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    yield_factor: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    selling_price_per_kg: Decimal,
    selling_currency: Currency,
    #[serde(with = "rust_decimal::serde::float_option")]
    fx_usd_to_eur: Option<Decimal>,
    #[serde(skip)]
    selling_price_cost_basis: Decimal,
}

fn default_yield_factor() -> Decimal {
    Decimal::new(84, 2)
}

impl MarginCalcInput {
    /// Validate a request and normalize the selling price into the cost currency
    ///
    /// Without an explicit `fx_usd_to_eur` the figures are taken as sharing one
    /// currency. With a rate and differing currencies, the selling price is
    /// converted into the purchase currency.
    pub fn parse(request: MarginCalcRequest, fx: &FxRates) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();

        let purchase_price =
            errors.required("purchase_price_per_kg", request.purchase_price_per_kg);
        if let Some(price) = purchase_price {
            errors.check("purchase_price_per_kg", validate_positive(price));
        }

        let selling_price = errors.required("selling_price_per_kg", request.selling_price_per_kg);
        if let Some(price) = selling_price {
            errors.check("selling_price_per_kg", validate_positive(price));
        }

        let landed_costs = request.landed_costs_per_kg.unwrap_or(Decimal::ZERO);
        errors.check("landed_costs_per_kg", validate_non_negative(landed_costs));

        let roast_and_pack = request.roast_and_pack_costs_per_kg.unwrap_or(Decimal::ZERO);
        errors.check("roast_and_pack_costs_per_kg", validate_non_negative(roast_and_pack));

        let yield_factor = request.yield_factor.unwrap_or_else(default_yield_factor);
        errors.check("yield_factor", validate_yield_factor(yield_factor));

        if let Some(rate) = request.fx_usd_to_eur {
            errors.check("fx_usd_to_eur", validate_positive(rate));
        }

        let purchase_currency = parse_currency(
            &mut errors,
            "purchase_currency",
            request.purchase_currency.as_deref().unwrap_or("USD"),
        );
        let selling_currency = parse_currency(
            &mut errors,
            "selling_currency",
            request.selling_currency.as_deref().unwrap_or("EUR"),
        );

        let (Some(purchase_price), Some(selling_price), Some(purchase_currency), Some(selling_currency)) =
            (purchase_price, selling_price, purchase_currency, selling_currency)
        else {
            return Err(errors);
        };
        errors.into_result()?;

        let selling_price_cost_basis = match request.fx_usd_to_eur {
            Some(rate) if purchase_currency != selling_currency => fx
                .to_common_currency(selling_price, selling_currency, purchase_currency, Some(rate))
                .map_err(|e| e.into_validation("selling_currency"))?,
            _ => selling_price,
        };

        let input = Self {
            purchase_price_per_kg: purchase_price,
            purchase_currency,
            landed_costs_per_kg: landed_costs,
            roast_and_pack_costs_per_kg: roast_and_pack,
            yield_factor,
            selling_price_per_kg: selling_price,
            selling_currency,
            fx_usd_to_eur: request.fx_usd_to_eur,
            selling_price_cost_basis,
        };
        if let Err(fault) = try_margin_outputs(&input) {
            let mut errors = ValidationError::new();
            errors.push_fault(fault);
            return Err(errors);
        }
        Ok(input)
    }

    pub fn purchase_price_per_kg(&self) -> Decimal {
        self.purchase_price_per_kg
    }

    pub fn purchase_currency(&self) -> Currency {
        self.purchase_currency
    }

    pub fn landed_costs_per_kg(&self) -> Decimal {
        self.landed_costs_per_kg
    }

    pub fn roast_and_pack_costs_per_kg(&self) -> Decimal {
        self.roast_and_pack_costs_per_kg
    }

    pub fn yield_factor(&self) -> Decimal {
        self.yield_factor
    }

    pub fn selling_price_per_kg(&self) -> Decimal {
        self.selling_price_per_kg
    }

    pub fn selling_currency(&self) -> Currency {
        self.selling_currency
    }

    pub fn fx_usd_to_eur(&self) -> Option<Decimal> {
        self.fx_usd_to_eur
    }

    /// Selling price expressed in the purchase (cost) currency
    pub fn selling_price_cost_basis(&self) -> Decimal {
        self.selling_price_cost_basis
    }
}

impl TryFrom<MarginCalcRequest> for MarginCalcInput {
    type Error = ValidationError;

    fn try_from(request: MarginCalcRequest) -> Result<Self, Self::Error> {
        Self::parse(request, &FxRates::default())
    }
}

/// Named outputs of a margin calculation, all per kg in the cost currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginOutputs {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost_per_kg_green: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_per_kg_roasted_from_green: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost_per_kg_roasted: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub selling_price_per_kg_cost_basis: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub margin_per_kg: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub margin_pct: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub breakeven_price: Decimal,
}

/// Result of a margin calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginCalcResult {
    pub computed_at: DateTime<Utc>,
    pub inputs: MarginCalcInput,
    pub outputs: MarginOutputs,
}

fn try_margin_outputs(input: &MarginCalcInput) -> Result<MarginOutputs, Fault> {
    let total_cost_per_kg_green = sum(
        input.purchase_price_per_kg,
        input.landed_costs_per_kg,
        "landed_costs_per_kg",
    )?;
    let cost_per_kg_roasted_from_green = quotient(total_cost_per_kg_green, input.yield_factor, "yield_factor")?;
    let total_cost_per_kg_roasted = sum(
        cost_per_kg_roasted_from_green,
        input.roast_and_pack_costs_per_kg,
        "roast_and_pack_costs_per_kg",
    )?;

    let selling_price = input.selling_price_cost_basis;
    let margin_per_kg = difference(selling_price, total_cost_per_kg_roasted, "selling_price_per_kg")?;
    let margin_pct = product(
        quotient(margin_per_kg, selling_price, "selling_price_per_kg")?,
        Decimal::ONE_HUNDRED,
        "selling_price_per_kg",
    )?;

    Ok(MarginOutputs {
        total_cost_per_kg_green,
        cost_per_kg_roasted_from_green,
        total_cost_per_kg_roasted,
        selling_price_per_kg_cost_basis: selling_price,
        margin_per_kg,
        margin_pct,
        breakeven_price: total_cost_per_kg_roasted,
    })
}

/// Compute the per-kg margin figures
pub fn margin_outputs(input: &MarginCalcInput) -> MarginOutputs {
    validated(try_margin_outputs(input))
}

/// Calculate margin for validated input, stamped with the current time
pub fn calculate_margin(input: &MarginCalcInput) -> MarginCalcResult {
    calculate_margin_at(input, Utc::now())
}

/// Calculate margin with an explicit computation timestamp
pub fn calculate_margin_at(input: &MarginCalcInput, computed_at: DateTime<Utc>) -> MarginCalcResult {
    MarginCalcResult {
        computed_at,
        inputs: input.clone(),
        outputs: margin_outputs(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn request() -> MarginCalcRequest {
        MarginCalcRequest {
            purchase_price_per_kg: Some(dec("5.0")),
            purchase_currency: Some("USD".into()),
            landed_costs_per_kg: Some(dec("1.0")),
            roast_and_pack_costs_per_kg: Some(dec("2.0")),
            yield_factor: Some(dec("0.84")),
            selling_price_per_kg: Some(dec("10.0")),
            selling_currency: Some("USD".into()),
            fx_usd_to_eur: None,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let input = MarginCalcInput::try_from(MarginCalcRequest {
            purchase_price_per_kg: Some(dec("5")),
            selling_price_per_kg: Some(dec("12")),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(input.yield_factor(), dec("0.84"));
        assert_eq!(input.landed_costs_per_kg(), Decimal::ZERO);
        assert_eq!(input.roast_and_pack_costs_per_kg(), Decimal::ZERO);
        assert_eq!(input.purchase_currency(), Currency::Usd);
        assert_eq!(input.selling_currency(), Currency::Eur);
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let err = MarginCalcInput::try_from(MarginCalcRequest::default()).unwrap_err();
        assert!(err.has_field("purchase_price_per_kg"));
        assert!(err.has_field("selling_price_per_kg"));
    }

    #[test]
    fn test_yield_factor_exactly_one() {
        let input = MarginCalcInput::try_from(MarginCalcRequest {
            yield_factor: Some(Decimal::ONE),
            ..request()
        })
        .unwrap();
        let outputs = margin_outputs(&input);
        assert_eq!(outputs.cost_per_kg_roasted_from_green, dec("6"));
        assert_eq!(outputs.total_cost_per_kg_roasted, dec("8"));
    }

    #[test]
    fn test_negative_margin() {
        let input = MarginCalcInput::try_from(MarginCalcRequest {
            purchase_price_per_kg: Some(dec("8.0")),
            landed_costs_per_kg: Some(dec("3.0")),
            roast_and_pack_costs_per_kg: Some(dec("3.0")),
            ..request()
        })
        .unwrap();
        let outputs = margin_outputs(&input);
        assert!(outputs.margin_per_kg < Decimal::ZERO);
        assert!(outputs.margin_pct < Decimal::ZERO);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let err = MarginCalcInput::try_from(MarginCalcRequest {
            selling_currency: Some("XBT".into()),
            ..request()
        })
        .unwrap_err();
        assert!(err.has_field("selling_currency"));
    }

    #[test]
    fn test_fx_normalizes_selling_price_into_cost_currency() {
        let input = MarginCalcInput::try_from(MarginCalcRequest {
            selling_currency: Some("EUR".into()),
            selling_price_per_kg: Some(dec("17")),
            fx_usd_to_eur: Some(dec("0.85")),
            ..request()
        })
        .unwrap();

        // 17 EUR / 0.85 = 20 USD
        assert_eq!(input.selling_price_cost_basis(), dec("20"));
        let outputs = margin_outputs(&input);
        assert_eq!(outputs.selling_price_per_kg_cost_basis, dec("20"));
    }

    #[test]
    fn test_fx_with_unsupported_pair_rejected() {
        let err = MarginCalcInput::try_from(MarginCalcRequest {
            purchase_currency: Some("PEN".into()),
            selling_currency: Some("GBP".into()),
            fx_usd_to_eur: Some(dec("0.9")),
            ..request()
        })
        .unwrap_err();
        assert!(err.has_field("selling_currency"));
    }

    #[test]
    fn test_cost_too_large_for_yield_rejected() {
        let err = MarginCalcInput::try_from(MarginCalcRequest {
            purchase_price_per_kg: Some(dec("50000000000000000000000000000")),
            landed_costs_per_kg: Some(Decimal::ZERO),
            yield_factor: Some(dec("0.5")),
            ..request()
        })
        .unwrap_err();
        assert!(err.has_field("yield_factor"));
        assert_eq!(err.errors[0].code, "out_of_range");
    }

    #[test]
    fn test_inputs_serialize_as_numbers() {
        let input = MarginCalcInput::try_from(request()).unwrap();
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["yield_factor"], serde_json::json!(0.84));
        assert_eq!(json["purchase_currency"], "USD");
        assert!(json.get("selling_price_cost_basis").is_none());
    }
}
