//! Landed cost of an import shipment: goods, freight, insurance, duty, VAT and fees

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::invariant::{product, quotient, sum, validated, Fault};
use crate::models::currency::{Currency, FxRates};
use crate::validation::{parse_currency, validate_non_negative, validate_positive};

/// Trade terms supported by the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Incoterm {
    Exw,
    Fca,
    Fob,
    Cif,
    Dap,
}

/// Which main-carriage costs the buyer pays on top of the unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostInclusion {
    pub adds_freight: bool,
    pub adds_insurance: bool,
}

impl Incoterm {
    pub const ALL: [Incoterm; 5] = [
        Incoterm::Exw,
        Incoterm::Fca,
        Incoterm::Fob,
        Incoterm::Cif,
        Incoterm::Dap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Incoterm::Exw => "EXW",
            Incoterm::Fca => "FCA",
            Incoterm::Fob => "FOB",
            Incoterm::Cif => "CIF",
            Incoterm::Dap => "DAP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EXW" => Some(Incoterm::Exw),
            "FCA" => Some(Incoterm::Fca),
            "FOB" => Some(Incoterm::Fob),
            "CIF" => Some(Incoterm::Cif),
            "DAP" => Some(Incoterm::Dap),
            _ => None,
        }
    }

    /// Cost-inclusion table
    ///
    /// | Incoterm | freight added | insurance added |
    /// |----------|---------------|-----------------|
    /// | EXW      | yes           | yes             |
    /// | FCA      | yes           | yes             |
    /// | FOB      | yes           | yes             |
    /// | CIF      | no (bundled)  | no (bundled)    |
    /// | DAP      | no (bundled)  | no (bundled)    |
    pub fn cost_inclusion(&self) -> CostInclusion {
        match self {
            Incoterm::Exw | Incoterm::Fca | Incoterm::Fob => CostInclusion {
                adds_freight: true,
                adds_insurance: true,
            },
            Incoterm::Cif | Incoterm::Dap => CostInclusion {
                adds_freight: false,
                adds_insurance: false,
            },
        }
    }
}

impl std::fmt::Display for Incoterm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw landed cost request
///
/// Percentages are in percent: `duty_pct = 10` means 10%.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandedCostRequest {
    pub weight_kg: Option<Decimal>,
    pub green_price_usd_per_kg: Option<Decimal>,
    pub incoterm: Option<String>,
    pub freight_usd: Option<Decimal>,
    pub insurance_pct: Option<Decimal>,
    pub handling_eur: Option<Decimal>,
    pub inland_trucking_eur: Option<Decimal>,
    pub duty_pct: Option<Decimal>,
    pub vat_pct: Option<Decimal>,
    /// Convert every monetary field into this currency before summing
    pub settlement_currency: Option<String>,
    pub fx_usd_to_eur: Option<Decimal>,
}

/// Validated landed cost inputs, all monetary figures in one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandedCostInput {
    weight_kg: Decimal,
    green_price_per_kg: Decimal,
    incoterm: Incoterm,
    freight: Decimal,
    insurance_pct: Decimal,
    handling: Decimal,
    inland_trucking: Decimal,
    duty_pct: Decimal,
    vat_pct: Decimal,
    settlement_currency: Option<Currency>,
    fx_usd_to_eur: Option<Decimal>,
}

fn default_insurance_pct() -> Decimal {
    Decimal::new(6, 1)
}

fn default_vat_pct() -> Decimal {
    Decimal::from(19)
}

impl LandedCostInput {
    /// Validate a request, converting to the settlement currency when one is requested
    ///
    /// Without a settlement currency the USD and EUR fields are summed as
    /// given; the caller is asserting they already share one currency.
    pub fn parse(request: LandedCostRequest, fx: &FxRates) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();

        let weight_kg = errors.required("weight_kg", request.weight_kg);
        if let Some(weight) = weight_kg {
            errors.check("weight_kg", validate_positive(weight));
        }

        let green_price = errors.required("green_price_usd_per_kg", request.green_price_usd_per_kg);
        if let Some(price) = green_price {
            errors.check("green_price_usd_per_kg", validate_non_negative(price));
        }

        let incoterm_code = request.incoterm.as_deref().unwrap_or("FOB");
        let incoterm = Incoterm::from_code(incoterm_code);
        if incoterm.is_none() {
            errors.push(
                "incoterm",
                format!("Unsupported incoterm '{}'", incoterm_code.trim()),
            );
        }

        let freight_usd = request.freight_usd.unwrap_or(Decimal::ZERO);
        let insurance_pct = request.insurance_pct.unwrap_or_else(default_insurance_pct);
        let handling_eur = request.handling_eur.unwrap_or(Decimal::ZERO);
        let inland_trucking_eur = request.inland_trucking_eur.unwrap_or(Decimal::ZERO);
        let duty_pct = request.duty_pct.unwrap_or(Decimal::ZERO);
        let vat_pct = request.vat_pct.unwrap_or_else(default_vat_pct);

        for (field, value) in [
            ("freight_usd", freight_usd),
            ("insurance_pct", insurance_pct),
            ("handling_eur", handling_eur),
            ("inland_trucking_eur", inland_trucking_eur),
            ("duty_pct", duty_pct),
            ("vat_pct", vat_pct),
        ] {
            errors.check(field, validate_non_negative(value));
        }

        if let Some(rate) = request.fx_usd_to_eur {
            errors.check("fx_usd_to_eur", validate_positive(rate));
        }

        let settlement_currency = match request.settlement_currency.as_deref() {
            Some(code) => parse_currency(&mut errors, "settlement_currency", code),
            None => None,
        };

        let (Some(weight_kg), Some(green_price), Some(incoterm)) = (weight_kg, green_price, incoterm)
        else {
            return Err(errors);
        };
        errors.into_result()?;

        let (green_price_per_kg, freight, handling, inland_trucking, fx_used) =
            match settlement_currency {
                None => (green_price, freight_usd, handling_eur, inland_trucking_eur, None),
                Some(target) => {
                    let convert = |amount: Decimal, from: Currency| {
                        fx.to_common_currency(amount, from, target, request.fx_usd_to_eur)
                            .map_err(|e| e.into_validation("settlement_currency"))
                    };
                    (
                        convert(green_price, Currency::Usd)?,
                        convert(freight_usd, Currency::Usd)?,
                        convert(handling_eur, Currency::Eur)?,
                        convert(inland_trucking_eur, Currency::Eur)?,
                        Some(request.fx_usd_to_eur.unwrap_or(fx.default_usd_to_eur)),
                    )
                }
            };

        let input = Self {
            weight_kg,
            green_price_per_kg,
            incoterm,
            freight,
            insurance_pct,
            handling,
            inland_trucking,
            duty_pct,
            vat_pct,
            settlement_currency,
            fx_usd_to_eur: fx_used,
        };
        if let Err(fault) = try_cost_lines(&input) {
            let mut errors = ValidationError::new();
            errors.push_fault(fault);
            return Err(errors);
        }
        Ok(input)
    }

    pub fn weight_kg(&self) -> Decimal {
        self.weight_kg
    }

    pub fn incoterm(&self) -> Incoterm {
        self.incoterm
    }

    pub fn settlement_currency(&self) -> Option<Currency> {
        self.settlement_currency
    }
}

impl TryFrom<LandedCostRequest> for LandedCostInput {
    type Error = ValidationError;

    fn try_from(request: LandedCostRequest) -> Result<Self, Self::Error> {
        Self::parse(request, &FxRates::default())
    }
}

/// Itemized landed cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandedCostResult {
    pub calculated_at: DateTime<Utc>,
    pub incoterm: Incoterm,
    pub settlement_currency: Option<Currency>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub fx_usd_to_eur: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight_kg: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub goods_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub freight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub insurance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cif_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub duty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat_base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub handling: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub inland_trucking: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_landed_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub landed_cost_per_kg: Decimal,
}

fn percent_of(pct: Decimal, amount: Decimal, pct_field: &'static str) -> Result<Decimal, Fault> {
    product(quotient(pct, Decimal::ONE_HUNDRED, pct_field)?, amount, pct_field)
}

/// Itemized cost lines before timestamping
struct CostLines {
    goods_value: Decimal,
    freight: Decimal,
    insurance: Decimal,
    cif_value: Decimal,
    duty: Decimal,
    vat_base: Decimal,
    vat: Decimal,
    total_landed_cost: Decimal,
    landed_cost_per_kg: Decimal,
}

fn try_cost_lines(input: &LandedCostInput) -> Result<CostLines, Fault> {
    let inclusion = input.incoterm.cost_inclusion();

    let goods_value = product(input.green_price_per_kg, input.weight_kg, "weight_kg")?;
    let freight = if inclusion.adds_freight {
        input.freight
    } else {
        Decimal::ZERO
    };
    let insurance = if inclusion.adds_insurance {
        percent_of(input.insurance_pct, goods_value, "insurance_pct")?
    } else {
        Decimal::ZERO
    };

    let cif_value = sum(sum(goods_value, freight, "freight_usd")?, insurance, "insurance_pct")?;
    let duty = percent_of(input.duty_pct, cif_value, "duty_pct")?;
    let vat_base = sum(cif_value, duty, "duty_pct")?;
    let vat = percent_of(input.vat_pct, vat_base, "vat_pct")?;
    let total_landed_cost = sum(vat_base, vat, "vat_pct")?;
    let total_landed_cost = sum(total_landed_cost, input.handling, "handling_eur")?;
    let total_landed_cost = sum(total_landed_cost, input.inland_trucking, "inland_trucking_eur")?;
    let landed_cost_per_kg = quotient(total_landed_cost, input.weight_kg, "weight_kg")?;

    Ok(CostLines {
        goods_value,
        freight,
        insurance,
        cif_value,
        duty,
        vat_base,
        vat,
        total_landed_cost,
        landed_cost_per_kg,
    })
}

/// Calculate landed cost for validated input
pub fn calculate_landed_cost(input: &LandedCostInput) -> LandedCostResult {
    calculate_landed_cost_at(input, Utc::now())
}

/// Calculate landed cost with an explicit timestamp
pub fn calculate_landed_cost_at(input: &LandedCostInput, calculated_at: DateTime<Utc>) -> LandedCostResult {
    let lines = validated(try_cost_lines(input));

    LandedCostResult {
        calculated_at,
        incoterm: input.incoterm,
        settlement_currency: input.settlement_currency,
        fx_usd_to_eur: input.fx_usd_to_eur,
        weight_kg: input.weight_kg,
        goods_value: lines.goods_value,
        freight: lines.freight,
        insurance: lines.insurance,
        cif_value: lines.cif_value,
        duty: lines.duty,
        vat_base: lines.vat_base,
        vat: lines.vat,
        handling: input.handling,
        inland_trucking: input.inland_trucking,
        total_landed_cost: lines.total_landed_cost,
        landed_cost_per_kg: lines.landed_cost_per_kg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn request(incoterm: &str) -> LandedCostRequest {
        LandedCostRequest {
            weight_kg: Some(dec("1000")),
            green_price_usd_per_kg: Some(dec("5")),
            incoterm: Some(incoterm.to_string()),
            freight_usd: Some(dec("1000")),
            insurance_pct: Some(dec("1")),
            handling_eur: Some(Decimal::ZERO),
            inland_trucking_eur: Some(Decimal::ZERO),
            duty_pct: Some(Decimal::ZERO),
            vat_pct: Some(Decimal::ZERO),
            settlement_currency: None,
            fx_usd_to_eur: None,
        }
    }

    #[test]
    fn test_incoterm_codes_case_insensitive() {
        assert_eq!(Incoterm::from_code("fob"), Some(Incoterm::Fob));
        assert_eq!(Incoterm::from_code(" Cif "), Some(Incoterm::Cif));
        assert_eq!(Incoterm::from_code("DDP"), None);
    }

    #[test]
    fn test_cost_inclusion_table() {
        for term in [Incoterm::Exw, Incoterm::Fca, Incoterm::Fob] {
            let inclusion = term.cost_inclusion();
            assert!(inclusion.adds_freight && inclusion.adds_insurance, "{}", term);
        }
        for term in [Incoterm::Cif, Incoterm::Dap] {
            let inclusion = term.cost_inclusion();
            assert!(!inclusion.adds_freight && !inclusion.adds_insurance, "{}", term);
        }
    }

    #[test]
    fn test_each_incoterm_independently() {
        let expected = [
            (Incoterm::Exw, dec("6050")),
            (Incoterm::Fca, dec("6050")),
            (Incoterm::Fob, dec("6050")),
            (Incoterm::Cif, dec("5000")),
            (Incoterm::Dap, dec("5000")),
        ];
        for (term, cif) in expected {
            let input = LandedCostInput::try_from(request(term.as_str())).unwrap();
            let result = calculate_landed_cost(&input);
            assert_eq!(result.cif_value, cif, "{}", term);
        }
    }

    #[test]
    fn test_defaults() {
        let input = LandedCostInput::try_from(LandedCostRequest {
            weight_kg: Some(dec("100")),
            green_price_usd_per_kg: Some(dec("4")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(input.incoterm(), Incoterm::Fob);
        assert_eq!(input.insurance_pct, dec("0.6"));
        assert_eq!(input.vat_pct, dec("19"));
        assert_eq!(input.duty_pct, Decimal::ZERO);
    }

    #[test]
    fn test_zero_weight_rejected() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            weight_kg: Some(Decimal::ZERO),
            ..request("FOB")
        })
        .unwrap_err();
        assert!(err.has_field("weight_kg"));
    }

    #[test]
    fn test_negative_fields_all_reported() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            freight_usd: Some(dec("-500")),
            handling_eur: Some(dec("-1")),
            vat_pct: Some(dec("-19")),
            ..request("FOB")
        })
        .unwrap_err();
        assert!(err.has_field("freight_usd"));
        assert!(err.has_field("handling_eur"));
        assert!(err.has_field("vat_pct"));
    }

    #[test]
    fn test_unknown_incoterm_rejected() {
        let err = LandedCostInput::try_from(request("DDP")).unwrap_err();
        assert!(err.has_field("incoterm"));
    }

    #[test]
    fn test_settlement_in_eur_converts_usd_fields() {
        let input = LandedCostInput::try_from(LandedCostRequest {
            settlement_currency: Some("EUR".into()),
            fx_usd_to_eur: Some(dec("0.9")),
            handling_eur: Some(dec("100")),
            ..request("FOB")
        })
        .unwrap();
        let result = calculate_landed_cost(&input);

        assert_eq!(result.settlement_currency, Some(Currency::Eur));
        assert_eq!(result.fx_usd_to_eur, Some(dec("0.9")));
        assert_eq!(result.goods_value, dec("4500"));
        assert_eq!(result.freight, dec("900"));
        assert_eq!(result.handling, dec("100"));
    }

    #[test]
    fn test_goods_value_overflow_rejected() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            weight_kg: Some(dec("100000000000000000000")),
            green_price_usd_per_kg: Some(dec("10000000000")),
            ..request("FOB")
        })
        .unwrap_err();
        assert!(err.has_field("weight_kg"));
        assert_eq!(err.errors[0].code, "out_of_range");
    }

    #[test]
    fn test_huge_duty_rate_rejected() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            duty_pct: Some(dec("10000000000000000000000000")),
            green_price_usd_per_kg: Some(dec("1000000")),
            ..request("FOB")
        })
        .unwrap_err();
        assert!(err.has_field("duty_pct"));
    }

    #[test]
    fn test_settlement_in_unsupported_currency_rejected() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            settlement_currency: Some("PEN".into()),
            ..request("FOB")
        })
        .unwrap_err();
        assert!(err.has_field("settlement_currency"));
    }
}
