//! Lithium-ion accumulators (HS 8507.60), UN3480 Class 9 dangerous goods.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeMap;

use super::{
    data_flag, data_number, ExtraCharge, FieldDefinition, FieldType, MetricDefinition,
    MetricFormat, ProductData, ProductModule,
};
use crate::calc::output::{AuditValue, CalcOutput};
use crate::types::Money;

pub const LITHIUM_HS6: &str = "850760";

/// Flat per-shipment handling and documentation surcharge for Class 9 cargo.
pub const DANGEROUS_GOODS_SURCHARGE_ZAR: Money = dec!(1850);

pub fn lithium_batteries() -> ProductModule {
    ProductModule {
        id: "lithium-batteries",
        name: "Lithium Ion Batteries",
        description: Some("Battery packs and cells shipped as UN3480/UN3481"),
        matches: |hs6| hs6 == LITHIUM_HS6,
        fields: vec![
            FieldDefinition {
                id: "voltage".into(),
                label: "System Voltage".into(),
                field_type: FieldType::Number,
                options: vec![],
                default_value: Some(json!(12)),
                suffix: Some("V".into()),
                group: Some("Battery Specs".into()),
                required: true,
            },
            FieldDefinition {
                id: "amp_hours".into(),
                label: "Capacity".into(),
                field_type: FieldType::Number,
                options: vec![],
                default_value: Some(json!(100)),
                suffix: Some("Ah".into()),
                group: Some("Battery Specs".into()),
                required: true,
            },
            FieldDefinition {
                id: "is_dangerous_goods".into(),
                label: "UN3480 (Class 9 Hazmat)".into(),
                field_type: FieldType::Boolean,
                options: vec![],
                default_value: Some(json!(true)),
                suffix: None,
                group: Some("Compliance".into()),
                required: false,
            },
        ],
        metrics: vec![MetricDefinition {
            id: "cost_per_kwh",
            label: "Landed Cost / kWh",
            format: MetricFormat::Currency,
            calculate: cost_per_kwh,
        }],
        enrich_inputs: None,
        calculate_extras: Some(dangerous_goods_extras),
    }
}

/// Per-unit landed cost divided by per-unit energy capacity. Zero when the
/// capacity is non-positive or the figures overflow.
fn cost_per_kwh(output: &CalcOutput, data: &ProductData) -> Decimal {
    let kwh_per_unit = data_number(data, "voltage")
        .checked_mul(data_number(data, "amp_hours"))
        .and_then(|wh| wh.checked_div(dec!(1000)));
    match kwh_per_unit {
        Some(kwh) if kwh > Decimal::ZERO => output
            .landed_cost_per_unit_zar
            .checked_div(kwh)
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn dangerous_goods_extras(data: &ProductData) -> Vec<ExtraCharge> {
    if !data_flag(data, "is_dangerous_goods") {
        return Vec::new();
    }

    let mut values_used = BTreeMap::new();
    values_used.insert("is_dangerous_goods".to_string(), AuditValue::from("true"));
    let mut rates_applied = BTreeMap::new();
    rates_applied.insert("flat".to_string(), DANGEROUS_GOODS_SURCHARGE_ZAR);

    vec![ExtraCharge {
        key: "hazmat_surcharge".into(),
        label: "Dangerous Goods Handling (Class 9)".into(),
        amount_zar: DANGEROUS_GOODS_SURCHARGE_ZAR,
        formula: "flat per-shipment surcharge".into(),
        values_used,
        rates_applied,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::engine::{calculate_landed_cost, CalcContext};
    use crate::calc::input::base_input;
    use crate::products::ProductRegistry;
    use crate::tariff::fixtures::seeded_repository;

    fn battery_bag(dangerous: bool) -> ProductData {
        serde_json::from_value(json!({
            "voltage": 48,
            "amp_hours": 100,
            "is_dangerous_goods": dangerous
        }))
        .unwrap()
    }

    #[test]
    fn test_matches_only_lithium_heading() {
        let module = lithium_batteries();
        assert!((module.matches)("850760"));
        assert!(!(module.matches)("850710"));
    }

    #[test]
    fn test_cost_per_kwh_oversized_fields_yield_zero() {
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::builtin();
        let ctx = CalcContext::new(&tariffs, &products);
        let mut input = base_input();
        input.hs6 = LITHIUM_HS6.into();
        let output = calculate_landed_cost(&ctx, &input).unwrap();

        let module = lithium_batteries();
        let huge: ProductData = serde_json::from_value(json!({
            "voltage": "79228162514264337593543950335",
            "amp_hours": 10
        }))
        .unwrap();
        let metrics = module.evaluate_metrics(&output, &huge);
        assert_eq!(metrics[0].id, "cost_per_kwh");
        assert_eq!(metrics[0].value, Decimal::ZERO);

        // Capacity below decimal precision rounds to zero
        let tiny: ProductData = serde_json::from_value(json!({
            "voltage": "0.0000000000000000000000000001",
            "amp_hours": "0.0000000000000000000000000001"
        }))
        .unwrap();
        assert_eq!(cost_per_kwh(&output, &tiny), Decimal::ZERO);
    }

    #[test]
    fn test_dangerous_goods_surcharge_line() {
        let extras = dangerous_goods_extras(&battery_bag(true));
        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].amount_zar, dec!(1850));
        assert!(dangerous_goods_extras(&battery_bag(false)).is_empty());
    }

    #[test]
    fn test_cost_per_kwh_against_unit_cost() {
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::builtin();
        let ctx = CalcContext::new(&tariffs, &products);

        let mut input = base_input();
        input.hs6 = LITHIUM_HS6.into();
        input.quantity = 10;
        input.product_data = Some(battery_bag(true));
        let output = calculate_landed_cost(&ctx, &input).unwrap();

        let module = lithium_batteries();
        let metrics = module.evaluate_metrics(&output, input.product_data.as_ref().unwrap());
        // 48 V x 100 Ah = 4.8 kWh per unit
        let expected = crate::types::round_money(output.landed_cost_per_unit_zar / dec!(4.8));
        assert_eq!(metrics[0].id, "cost_per_kwh");
        assert_eq!(metrics[0].value, expected);
    }

    #[test]
    fn test_zero_capacity_metric_is_zero() {
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::builtin();
        let ctx = CalcContext::new(&tariffs, &products);
        let mut input = base_input();
        input.hs6 = LITHIUM_HS6.into();
        let output = calculate_landed_cost(&ctx, &input).unwrap();

        let data: ProductData = serde_json::from_value(json!({"voltage": 0})).unwrap();
        let metrics = lithium_batteries().evaluate_metrics(&output, &data);
        assert_eq!(metrics[0].value, Decimal::ZERO);
    }
}
