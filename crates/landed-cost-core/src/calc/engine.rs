//! Forward landed-cost waterfall.
//!
//! Order of operations:
//! 1. **Rate resolution** -- tariff lookup, else manual duty rate at default VAT, else no result.
//! 2. **Product enrichment** -- a matching module may rewrite the input.
//! 3. **Risk basis** -- invoice (and freight/insurance when included) scaled by the FX buffer.
//! 4. **Customs value** -- freight and insurance excluded under CIF unless overridden.
//! 5. **Duty and levies** -- ad valorem on customs value.
//! 6. **Ancillary charges** -- agency fee, port/terminal, demurrage.
//! 7. **VAT** -- on customs value plus duty, levies, fees and ancillary charges.
//! 8. **Totals** -- taxes, landed cost, per-unit cost, gross margin, verdict.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use super::charges::{
    demurrage_charge, demurrage_daily_rate, estimate_agency_fee, estimate_port_charges,
    port_base_charge, port_surcharge_rate, AGENCY_BASE_FEE_ZAR, AGENCY_DISBURSEMENT_RATE,
    AGENCY_DISBURSEMENT_THRESHOLD_ZAR, DEMURRAGE_FREE_DAYS,
};
use super::heuristics::{confidence_label, verdict, warnings};
use super::input::CalcInput;
use super::output::{AuditTrail, AuditValue, BreakdownLine, CalcOutput, LineId};
use crate::products::{ProductData, ProductRegistry};
use crate::tariff::{TariffRate, TariffRepository, TariffVersion};
use crate::types::{round_money, Incoterm, Money, Rate};

/// VAT applied when the caller supplies a manual duty rate for an unseeded route.
pub const DEFAULT_VAT_RATE: Rate = dec!(0.15);

const CUSTOM_ENTRY_VERSION_ID: &str = "custom-entry";

/// Read-only collaborators a calculation runs against. Cheap to copy; safe
/// to share across threads.
#[derive(Clone, Copy)]
pub struct CalcContext<'a> {
    pub tariffs: &'a dyn TariffRepository,
    pub products: &'a ProductRegistry,
}

impl<'a> CalcContext<'a> {
    pub fn new(tariffs: &'a dyn TariffRepository, products: &'a ProductRegistry) -> Self {
        CalcContext { tariffs, products }
    }
}

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

/// Run the waterfall for one shipment.
///
/// Returns `None` only when the route has no tariff rate and no manual duty
/// rate was supplied; every other condition surfaces as a warning.
pub fn calculate_landed_cost(ctx: &CalcContext<'_>, input: &CalcInput) -> Option<CalcOutput> {
    let version = ctx.tariffs.tariff_version();

    // --- Rate resolution ---
    let (rate, rate_resolved) = match ctx.tariffs.tariff_rate(&input.hs6, &input.origin, &input.dest)
    {
        Some(rate) => (Cow::Borrowed(rate), true),
        None => match input.custom_duty_rate {
            Some(duty_rate) => {
                debug!(hs6 = %input.hs6, origin = %input.origin, dest = %input.dest, %duty_rate,
                    "no tariff rate on file, using manual duty rate");
                (Cow::Owned(manual_rate(input, duty_rate)), false)
            }
            None => {
                debug!(hs6 = %input.hs6, origin = %input.origin, dest = %input.dest,
                    "no tariff rate on file and no manual duty rate");
                return None;
            }
        },
    };

    // --- Product enrichment ---
    let module = ctx.products.find(&input.hs6);
    let product_data: Option<ProductData> = match (module, &input.product_data) {
        (Some(m), Some(data)) => Some(m.with_field_defaults(data)),
        _ => None,
    };
    let working: Cow<'_, CalcInput> = match (module.and_then(|m| m.enrich_inputs), &product_data) {
        (Some(enrich), Some(data)) => Cow::Owned(enrich(input, data)),
        _ => Cow::Borrowed(input),
    };
    let input = &*working;
    if let Some(m) = module {
        debug!(module = m.id, hs6 = %input.hs6, "product module matched");
    }

    // --- Risk basis and customs value ---
    let risk_multiplier = Decimal::ONE + input.forex_buffer_percent() / dec!(100);
    let freight_excluded = input.incoterm == Incoterm::CIF && !input.override_cif_freight_insurance;
    let (freight, insurance) = if freight_excluded {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            input.freight_zar * risk_multiplier,
            input.insurance_zar * risk_multiplier,
        )
    };
    let customs_value = input.invoice_value_zar * risk_multiplier + freight + insurance;

    // --- Duty and levies ---
    let duty_amount = customs_value * rate.duty_rate;
    let levy_amount: Money = rate.levies.values().map(|levy| customs_value * *levy).sum();

    // --- Ancillary charges ---
    let mode = input.shipping_mode_or_default();
    let port = input.port_of_entry_or_default();
    let agency_fee = if input.use_agency_estimate {
        estimate_agency_fee(customs_value)
    } else {
        Decimal::ZERO
    };
    let port_charges = estimate_port_charges(mode, port);
    let demurrage_days = input.demurrage_days();
    let demurrage = demurrage_charge(demurrage_days, mode);

    // --- VAT ---
    let vat_base = customs_value
        + duty_amount
        + levy_amount
        + input.other_fees_zar
        + agency_fee
        + port_charges
        + demurrage;
    let vat_amount = vat_base * rate.vat_rate;

    // --- Product extras ---
    let empty = ProductData::new();
    let extras = module
        .and_then(|m| m.calculate_extras)
        .map(|extras_fn| extras_fn(product_data.as_ref().unwrap_or(&empty)))
        .unwrap_or_default();
    let product_extras: Money = extras.iter().map(|e| e.amount_zar).sum();

    // --- Totals ---
    let duty_rounded = round_money(duty_amount);
    let vat_rounded = round_money(vat_amount);
    let levy_rounded = round_money(levy_amount);
    let total_taxes = duty_rounded + vat_rounded + levy_rounded;

    let landed_cost_total = customs_value
        + input.other_fees_zar
        + duty_amount
        + vat_amount
        + levy_amount
        + agency_fee
        + port_charges
        + demurrage
        + product_extras;

    let quantity = input.effective_quantity();
    let landed_cost_per_unit = landed_cost_total / quantity;
    let revenue = input.selling_price_per_unit_zar * quantity;
    let gross_margin_percent = if revenue > Decimal::ZERO {
        (revenue - landed_cost_total) / revenue * dec!(100)
    } else {
        Decimal::ZERO
    };

    // --- Breakdown ---
    let cv_rounded = round_money(customs_value);

    let mut breakdown = vec![
        BreakdownLine {
            id: LineId::Duty,
            label: "Import Duty".into(),
            amount_zar: duty_rounded,
            audit: audit_trail(
                version,
                "customs_value * duty_rate",
                vec![("customs_value", cv_rounded.into())],
                vec![("duty_rate", rate.duty_rate)],
            ),
        },
        BreakdownLine {
            id: LineId::Levies,
            label: "Levies".into(),
            amount_zar: levy_rounded,
            audit: AuditTrail::new(
                version,
                "sum(customs_value * levy_rate_i)",
                keyed(vec![("customs_value", cv_rounded.into())]),
                rate.levies.clone(),
            ),
        },
        BreakdownLine {
            id: LineId::Vat,
            label: "VAT".into(),
            amount_zar: vat_rounded,
            audit: audit_trail(
                version,
                "(customs_value + duty + levies + fees + agency + port + demurrage) * vat_rate",
                vec![
                    ("customs_value", cv_rounded.into()),
                    ("duty", duty_rounded.into()),
                    ("levies", levy_rounded.into()),
                    ("fees", round_money(input.other_fees_zar).into()),
                    ("agency", agency_fee.into()),
                    ("port", port_charges.into()),
                    ("demurrage", round_money(demurrage).into()),
                ],
                vec![("vat_rate", rate.vat_rate)],
            ),
        },
        BreakdownLine {
            id: LineId::Shipping,
            label: "Port & Terminal".into(),
            amount_zar: port_charges,
            audit: audit_trail(
                version,
                "port_base[mode] * (1 + port_surcharge)",
                vec![("mode", mode.code().into()), ("port", port.code().into())],
                vec![
                    ("base", port_base_charge(mode)),
                    ("port_surcharge", port_surcharge_rate(port)),
                ],
            ),
        },
    ];

    if agency_fee > Decimal::ZERO {
        breakdown.push(BreakdownLine {
            id: LineId::Agency,
            label: "Clearing Agency".into(),
            amount_zar: agency_fee,
            audit: audit_trail(
                version,
                "base_fee + disbursement_rate * max(0, customs_value - threshold)",
                vec![("customs_value", cv_rounded.into())],
                vec![
                    ("base_fee", AGENCY_BASE_FEE_ZAR),
                    ("disbursement_rate", AGENCY_DISBURSEMENT_RATE),
                    ("threshold", AGENCY_DISBURSEMENT_THRESHOLD_ZAR),
                ],
            ),
        });
    }

    if demurrage > Decimal::ZERO {
        breakdown.push(BreakdownLine {
            id: LineId::Risk,
            label: "Risk: Demurrage".into(),
            amount_zar: round_money(demurrage),
            audit: audit_trail(
                version,
                "(days - free_days) * daily_rate",
                vec![
                    ("days", Decimal::from(demurrage_days).into()),
                    ("free_days", Decimal::from(DEMURRAGE_FREE_DAYS).into()),
                    ("mode", mode.code().into()),
                ],
                vec![("daily_rate", demurrage_daily_rate(mode))],
            ),
        });
    }

    breakdown.push(BreakdownLine {
        id: LineId::Fees,
        label: "Other Manual Fees".into(),
        amount_zar: round_money(input.other_fees_zar),
        audit: audit_trail(
            version,
            "user input",
            vec![("other_fees", round_money(input.other_fees_zar).into())],
            vec![],
        ),
    });

    breakdown.extend(extras.into_iter().map(|extra| BreakdownLine {
        id: LineId::ProductExtra(extra.key),
        label: extra.label,
        amount_zar: round_money(extra.amount_zar),
        audit: AuditTrail::new(version, &extra.formula, extra.values_used, extra.rates_applied),
    }));

    Some(CalcOutput {
        customs_value_zar: cv_rounded,
        duty_amount_zar: duty_rounded,
        vat_amount_zar: vat_rounded,
        levy_amount_zar: levy_rounded,
        total_taxes_zar: total_taxes,
        agency_fee_zar: agency_fee,
        port_charges_zar: port_charges,
        demurrage_zar: round_money(demurrage),
        product_extras_zar: round_money(product_extras),
        other_fees_zar: round_money(input.other_fees_zar),
        landed_cost_total_zar: round_money(landed_cost_total),
        landed_cost_per_unit_zar: round_money(landed_cost_per_unit),
        gross_margin_percent: round_money(gross_margin_percent),
        verdict: verdict(gross_margin_percent).to_string(),
        confidence_label: confidence_label(input, rate_resolved),
        warnings: warnings(input, freight_excluded, !rate_resolved),
        breakdown,
        tariff_version_label: version.label.clone(),
        effective_date: version.effective_date,
        source_pointer_short: version.source_pointer_short.clone(),
    })
}

fn manual_rate(input: &CalcInput, duty_rate: Rate) -> TariffRate {
    TariffRate {
        tariff_version_id: CUSTOM_ENTRY_VERSION_ID.into(),
        hs6: input.hs6.clone(),
        origin_slug: input.origin.clone(),
        dest_slug: input.dest.clone(),
        duty_rate,
        vat_rate: DEFAULT_VAT_RATE,
        levies: BTreeMap::new(),
    }
}

fn audit_trail(
    version: &TariffVersion,
    formula: &str,
    values: Vec<(&str, AuditValue)>,
    rates: Vec<(&str, Rate)>,
) -> AuditTrail {
    AuditTrail::new(version, formula, keyed(values), keyed(rates))
}

fn keyed<V>(pairs: Vec<(&str, V)>) -> BTreeMap<String, V> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::heuristics::{WARNING_CIF_DOUBLE_COUNT, WARNING_MANUAL_DUTY_RATE};
    use crate::calc::input::base_input;
    use crate::products::{ExtraCharge, ProductModule};
    use crate::tariff::fixtures::seeded_repository;
    use crate::tariff::InMemoryTariffRepository;
    use crate::types::{ConfidenceLabel, PortOfEntry, ShippingMode};
    use serde_json::json;

    fn run(input: &CalcInput) -> Option<CalcOutput> {
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::builtin();
        calculate_landed_cost(&CalcContext::new(&tariffs, &products), input)
    }

    #[test]
    fn test_base_input_known_answer() {
        let out = run(&base_input()).unwrap();
        // CV = 50000 + 6000 + 900
        assert_eq!(out.customs_value_zar, dec!(56900));
        assert_eq!(out.duty_amount_zar, dec!(5690));
        // agency = 2250 + 0.005 x 6900
        assert_eq!(out.agency_fee_zar, dec!(2284.50));
        assert_eq!(out.port_charges_zar, dec!(2750));
        // VAT base = 56900 + 5690 + 2284.5 + 2750 = 67624.5
        assert_eq!(out.vat_amount_zar, dec!(10143.68));
        assert_eq!(out.total_taxes_zar, dec!(15833.68));
        // 56900 + 5690 + 10143.675 + 2284.5 + 2750 = 77768.175
        assert_eq!(out.landed_cost_total_zar, dec!(77768.18));
        assert_eq!(out.landed_cost_per_unit_zar, dec!(777.68));
        // (90000 - 77768.175) / 90000
        assert_eq!(out.gross_margin_percent, dec!(13.59));
        assert_eq!(out.confidence_label, ConfidenceLabel::High);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_breakdown_order_and_version_stamp() {
        let out = run(&base_input()).unwrap();
        let ids: Vec<LineId> = out.breakdown.iter().map(|l| l.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                LineId::Duty,
                LineId::Levies,
                LineId::Vat,
                LineId::Shipping,
                LineId::Agency,
                LineId::Fees
            ]
        );
        for line in &out.breakdown {
            assert_eq!(line.audit.tariff_version_label, "SARS-TARIFF-2026.02");
        }
    }

    #[test]
    fn test_levies_on_battery_route() {
        let mut input = base_input();
        input.hs6 = "850760".into();
        let out = run(&input).unwrap();
        // 1% environmental levy on 56900
        assert_eq!(out.levy_amount_zar, dec!(569));
        assert_eq!(
            out.line(&LineId::Levies).unwrap().audit.rates_applied.get("environmental"),
            Some(&dec!(0.01))
        );
    }

    #[test]
    fn test_cif_excludes_freight_and_insurance() {
        let mut input = base_input();
        input.incoterm = Incoterm::CIF;
        let out = run(&input).unwrap();
        assert_eq!(out.customs_value_zar, dec!(50000));
        assert!(out.warnings.contains(&WARNING_CIF_DOUBLE_COUNT.to_string()));
    }

    #[test]
    fn test_cif_override_keeps_freight() {
        let mut input = base_input();
        input.incoterm = Incoterm::CIF;
        input.override_cif_freight_insurance = true;
        let out = run(&input).unwrap();
        assert_eq!(out.customs_value_zar, dec!(56900));
        assert!(!out.warnings.contains(&WARNING_CIF_DOUBLE_COUNT.to_string()));
    }

    #[test]
    fn test_forex_buffer_scales_value_basis() {
        let mut input = base_input();
        input.risk_forex_buffer_percent = Some(dec!(10));
        let out = run(&input).unwrap();
        // 56900 x 1.1
        assert_eq!(out.customs_value_zar, dec!(62590));
        assert!(out
            .warnings
            .iter()
            .any(|w| w == "Risk: Applied 10% Forex volatility buffer."));
    }

    #[test]
    fn test_manual_duty_rate_for_unseeded_route() {
        let mut input = base_input();
        input.origin = "vietnam".into();
        assert!(run(&input).is_none());

        input.custom_duty_rate = Some(dec!(0.05));
        let out = run(&input).unwrap();
        assert_eq!(out.duty_amount_zar, dec!(2845));
        assert_eq!(out.line(&LineId::Vat).unwrap().audit.rates_applied["vat_rate"], dec!(0.15));
        assert_eq!(out.confidence_label, ConfidenceLabel::Low);
        assert!(out.warnings.contains(&WARNING_MANUAL_DUTY_RATE.to_string()));
    }

    #[test]
    fn test_seeded_rate_wins_over_manual_rate() {
        let mut input = base_input();
        input.custom_duty_rate = Some(dec!(0.50));
        let out = run(&input).unwrap();
        assert_eq!(out.duty_amount_zar, dec!(5690));
    }

    #[test]
    fn test_demurrage_line_and_warning() {
        let mut input = base_input();
        input.risk_demurrage_days = Some(5);
        input.shipping_mode = Some(ShippingMode::Fcl20);
        let out = run(&input).unwrap();
        assert_eq!(out.demurrage_zar, dec!(4400));
        assert_eq!(out.line(&LineId::Risk).unwrap().amount_zar, dec!(4400));
        assert!(out.warnings.iter().any(|w| w == "Risk: Including 2 days demurrage."));
    }

    #[test]
    fn test_agency_line_absent_when_disabled() {
        let mut input = base_input();
        input.use_agency_estimate = false;
        let out = run(&input).unwrap();
        assert_eq!(out.agency_fee_zar, Decimal::ZERO);
        assert!(out.line(&LineId::Agency).is_none());
    }

    #[test]
    fn test_zero_revenue_zero_margin() {
        let mut input = base_input();
        input.selling_price_per_unit_zar = Decimal::ZERO;
        let out = run(&input).unwrap();
        assert_eq!(out.gross_margin_percent, Decimal::ZERO);
    }

    #[test]
    fn test_zero_quantity_treated_as_one() {
        let mut input = base_input();
        input.quantity = 0;
        let out = run(&input).unwrap();
        assert_eq!(out.landed_cost_per_unit_zar, out.landed_cost_total_zar);
    }

    #[test]
    fn test_port_of_entry_affects_shipping_line() {
        let mut input = base_input();
        input.port_of_entry = Some(PortOfEntry::CPT);
        let out = run(&input).unwrap();
        assert_eq!(out.line(&LineId::Shipping).unwrap().amount_zar, dec!(2500));
    }

    #[test]
    fn test_hazmat_extra_added_to_total_not_taxes() {
        let mut input = base_input();
        input.hs6 = "850760".into();
        let plain = run(&input).unwrap();

        input.product_data = Some(
            serde_json::from_value(json!({"voltage": 48, "amp_hours": 100})).unwrap(),
        );
        let with_extras = run(&input).unwrap();

        assert_eq!(with_extras.product_extras_zar, dec!(1850));
        assert_eq!(with_extras.total_taxes_zar, plain.total_taxes_zar);
        assert_eq!(
            with_extras.landed_cost_total_zar - plain.landed_cost_total_zar,
            dec!(1850)
        );
        assert!(with_extras
            .line(&LineId::ProductExtra("hazmat_surcharge".into()))
            .is_some());
    }

    #[test]
    fn test_enrichment_hook_feeds_waterfall() {
        fn double_freight(base: &CalcInput, _data: &ProductData) -> CalcInput {
            CalcInput {
                freight_zar: base.freight_zar * dec!(2),
                ..base.clone()
            }
        }
        fn crating(_data: &ProductData) -> Vec<ExtraCharge> {
            vec![ExtraCharge {
                key: "crating".into(),
                label: "Crating".into(),
                amount_zar: dec!(100.005),
                formula: "flat".into(),
                values_used: BTreeMap::new(),
                rates_applied: BTreeMap::new(),
            }]
        }
        let module = ProductModule {
            id: "motors",
            name: "Electric Motors",
            description: None,
            matches: |hs6| hs6 == "850152",
            fields: vec![],
            metrics: vec![],
            enrich_inputs: Some(double_freight),
            calculate_extras: Some(crating),
        };
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::empty().register(module);
        let ctx = CalcContext::new(&tariffs, &products);

        let mut input = base_input();
        input.hs6 = "850152".into();
        input.product_data = Some(ProductData::new());
        let original = input.clone();
        let out = calculate_landed_cost(&ctx, &input).unwrap();

        // 50000 + 12000 + 900
        assert_eq!(out.customs_value_zar, dec!(62900));
        assert_eq!(out.product_extras_zar, dec!(100.01));
        assert_eq!(input, original);
    }

    #[test]
    fn test_enrichment_skipped_without_product_data() {
        fn zero_invoice(base: &CalcInput, _data: &ProductData) -> CalcInput {
            base.with_invoice_value(Decimal::ZERO)
        }
        let module = ProductModule {
            id: "lamps",
            name: "Lamps",
            description: None,
            matches: |hs6| hs6 == "940540",
            fields: vec![],
            metrics: vec![],
            enrich_inputs: Some(zero_invoice),
            calculate_extras: None,
        };
        let tariffs = seeded_repository().unwrap();
        let products = ProductRegistry::empty().register(module);
        let mut input = base_input();
        input.hs6 = "940540".into();
        let out = calculate_landed_cost(&CalcContext::new(&tariffs, &products), &input).unwrap();
        assert_eq!(out.customs_value_zar, dec!(56900));
    }

    #[test]
    fn test_substituted_repository_version() {
        let mut table = crate::tariff::fixtures::seed_table();
        table.version.label = "SARS-TARIFF-2026.07".into();
        let tariffs = InMemoryTariffRepository::from_table(table).unwrap();
        let products = ProductRegistry::empty();
        let out =
            calculate_landed_cost(&CalcContext::new(&tariffs, &products), &base_input()).unwrap();
        assert_eq!(out.tariff_version_label, "SARS-TARIFF-2026.07");
    }
}
