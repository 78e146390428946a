use landed_cost_core::calc::presets::{compute_scenario_presets, PresetTier};
use landed_cost_core::calc::reverse::calculate_max_purchase_price;
use landed_cost_core::calc::{base_input, calculate_landed_cost, CalcContext, CalcInput};
use landed_cost_core::products::ProductRegistry;
use landed_cost_core::tariff::fixtures::seeded_repository;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Reverse calculation -- maximum purchase price
// ===========================================================================

#[test]
fn test_reverse_calc_consistency() {
    let tariffs = seeded_repository().unwrap();
    let products = ProductRegistry::builtin();
    let ctx = CalcContext::new(&tariffs, &products);
    let base = base_input();

    let max_price = calculate_max_purchase_price(&ctx, dec!(2000), dec!(30), &base);
    assert!(max_price > Decimal::ZERO);

    let check = CalcInput {
        invoice_value_zar: max_price * Decimal::from(base.quantity),
        selling_price_per_unit_zar: dec!(2000),
        ..base.clone()
    };
    let out = calculate_landed_cost(&ctx, &check).unwrap();
    assert!(
        (out.gross_margin_percent - dec!(30)).abs() <= dec!(1),
        "Expected ~30% margin, got {}",
        out.gross_margin_percent
    );
}

#[test]
fn test_reverse_calc_higher_margin_lowers_price() {
    let tariffs = seeded_repository().unwrap();
    let products = ProductRegistry::builtin();
    let ctx = CalcContext::new(&tariffs, &products);
    let base = base_input();

    let at_20 = calculate_max_purchase_price(&ctx, dec!(2000), dec!(20), &base);
    let at_40 = calculate_max_purchase_price(&ctx, dec!(2000), dec!(40), &base);
    assert!(at_20 > at_40);
}

#[test]
fn test_reverse_calc_rounded_to_cents() {
    let tariffs = seeded_repository().unwrap();
    let products = ProductRegistry::builtin();
    let ctx = CalcContext::new(&tariffs, &products);
    let price = calculate_max_purchase_price(&ctx, dec!(1234.56), dec!(15), &base_input());
    assert!(price.scale() <= 2);
}

#[test]
fn test_reverse_calc_uses_quantity_floor() {
    let tariffs = seeded_repository().unwrap();
    let products = ProductRegistry::builtin();
    let ctx = CalcContext::new(&tariffs, &products);
    let mut zero = base_input();
    zero.quantity = 0;
    let mut one = base_input();
    one.quantity = 1;
    assert_eq!(
        calculate_max_purchase_price(&ctx, dec!(50000), dec!(25), &zero),
        calculate_max_purchase_price(&ctx, dec!(50000), dec!(25), &one)
    );
}

// ===========================================================================
// Scenario presets
// ===========================================================================

#[test]
fn test_presets_use_tier_invoice_values() {
    let tariffs = seeded_repository().unwrap();
    let products = ProductRegistry::builtin();
    let ctx = CalcContext::new(&tariffs, &products);

    let presets = compute_scenario_presets(&ctx, &base_input());
    assert_eq!(presets.len(), 3);
    for preset in &presets {
        assert_eq!(preset.invoice_value_zar, preset.id.invoice_value_zar());
    }
    assert_eq!(presets[0].id, PresetTier::R10k);
    assert_eq!(presets[2].invoice_value_zar, dec!(250000));
}
