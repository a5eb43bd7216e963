//! Landed cost calculator tests

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{calculate_landed_cost, FxRates, Incoterm, LandedCostInput, LandedCostRequest};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn fob_shipment() -> LandedCostRequest {
    LandedCostRequest {
        weight_kg: Some(dec("1000")),
        green_price_usd_per_kg: Some(dec("4.00")),
        incoterm: Some("FOB".into()),
        freight_usd: Some(dec("500")),
        insurance_pct: Some(dec("1")),
        handling_eur: Some(dec("50")),
        inland_trucking_eur: Some(dec("100")),
        duty_pct: Some(dec("10")),
        vat_pct: Some(dec("18")),
        settlement_currency: None,
        fx_usd_to_eur: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_fob_worked_example() {
        let input = LandedCostInput::try_from(fob_shipment()).unwrap();
        let result = calculate_landed_cost(&input);

        assert_eq!(result.goods_value, dec("4000"));
        assert_eq!(result.insurance, dec("40"));
        assert_eq!(result.cif_value, dec("4540"));
        assert_eq!(result.duty, dec("454"));
        assert_eq!(result.vat_base, dec("4994"));
        assert_eq!(result.vat, dec("898.92"));
        assert_eq!(result.total_landed_cost, dec("6042.92"));
        assert_eq!(result.landed_cost_per_kg, dec("6.04292"));
        assert_eq!(result.incoterm, Incoterm::Fob);
        assert_eq!(result.settlement_currency, None);
    }

    #[test]
    fn test_cif_bundles_freight_and_insurance() {
        let input = LandedCostInput::try_from(LandedCostRequest {
            incoterm: Some("cif".into()),
            ..fob_shipment()
        })
        .unwrap();
        let result = calculate_landed_cost(&input);

        assert_eq!(result.freight, Decimal::ZERO);
        assert_eq!(result.insurance, Decimal::ZERO);
        assert_eq!(result.cif_value, dec("4000"));
    }

    #[test]
    fn test_settlement_in_eur() {
        let input = LandedCostInput::parse(
            LandedCostRequest {
                settlement_currency: Some("EUR".into()),
                fx_usd_to_eur: Some(dec("0.90")),
                ..fob_shipment()
            },
            &FxRates::default(),
        )
        .unwrap();
        let result = calculate_landed_cost(&input);

        // goods 3600 EUR, freight 450 EUR, insurance 36 EUR
        assert_eq!(result.goods_value, dec("3600"));
        assert_eq!(result.freight, dec("450"));
        assert_eq!(result.cif_value, dec("4086"));
        assert_eq!(result.handling, dec("50"));
        assert_eq!(result.fx_usd_to_eur, Some(dec("0.90")));
    }

    #[test]
    fn test_settlement_uses_fallback_rate() {
        let input = LandedCostInput::parse(
            LandedCostRequest {
                settlement_currency: Some("EUR".into()),
                ..fob_shipment()
            },
            &FxRates::new(dec("0.80")),
        )
        .unwrap();
        let result = calculate_landed_cost(&input);

        assert_eq!(result.goods_value, dec("3200"));
        assert_eq!(result.fx_usd_to_eur, Some(dec("0.80")));
    }

    #[test]
    fn test_missing_weight_reported() {
        let err = LandedCostInput::try_from(LandedCostRequest {
            weight_kg: None,
            ..fob_shipment()
        })
        .unwrap_err();
        assert!(err.has_field("weight_kg"));
        assert_eq!(err.errors[0].code, "required");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn incoterm_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("EXW"), Just("FCA"), Just("FOB"), Just("CIF"), Just("DAP")]
    }

    /// Amount between 0.00 and 10000.00
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
    }

    /// Percentage between 0.0 and 30.0
    fn pct_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=300i64).prop_map(|tenths| Decimal::new(tenths, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The total is exactly the sum of its itemized parts
        #[test]
        fn prop_total_is_sum_of_components(
            weight in (1i64..=20_000i64).prop_map(Decimal::from),
            price in (1i64..=2000i64).prop_map(|cents| Decimal::new(cents, 2)),
            incoterm in incoterm_strategy(),
            freight in amount_strategy(),
            insurance_pct in pct_strategy(),
            handling in amount_strategy(),
            trucking in amount_strategy(),
            duty_pct in pct_strategy(),
            vat_pct in pct_strategy(),
        ) {
            let input = LandedCostInput::try_from(LandedCostRequest {
                weight_kg: Some(weight),
                green_price_usd_per_kg: Some(price),
                incoterm: Some(incoterm.to_string()),
                freight_usd: Some(freight),
                insurance_pct: Some(insurance_pct),
                handling_eur: Some(handling),
                inland_trucking_eur: Some(trucking),
                duty_pct: Some(duty_pct),
                vat_pct: Some(vat_pct),
                settlement_currency: None,
                fx_usd_to_eur: None,
            }).unwrap();
            let r = calculate_landed_cost(&input);

            prop_assert_eq!(r.cif_value, r.goods_value + r.freight + r.insurance);
            prop_assert_eq!(
                r.total_landed_cost,
                r.cif_value + r.duty + r.vat + r.handling + r.inland_trucking
            );
            prop_assert_eq!(r.vat_base, r.cif_value + r.duty);
            prop_assert!(r.landed_cost_per_kg >= Decimal::ZERO);
        }

        /// Non-positive weights never validate
        #[test]
        fn prop_non_positive_weight_rejected(weight in -10_000i64..=0i64) {
            let err = LandedCostInput::try_from(LandedCostRequest {
                weight_kg: Some(Decimal::from(weight)),
                ..fob_shipment()
            }).unwrap_err();
            prop_assert!(err.has_field("weight_kg"));
        }
    }
}
