//! FX and freight stress test.
//!
//! Re-prices a shipment under a weaker rand and dearer freight, and classifies
//! where the base cost structure is most exposed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::engine::{calculate_landed_cost, CalcContext};
use super::input::CalcInput;
use super::output::CalcOutput;
use crate::error::LandedCostError;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::LandedCostResult;

pub const FX_SHOCK: Rate = dec!(0.10);
pub const FREIGHT_SHOCK: Rate = dec!(0.20);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    pub label: String,
    /// Relative FX move, 0.10 = rand 10% weaker.
    pub fx_change: Rate,
    pub freight_change: Rate,
    pub landed_cost_total_zar: Money,
    pub landed_cost_per_unit_zar: Money,
    pub delta_vs_base_zar: Money,
    /// Percent change in landed cost vs base.
    pub delta_vs_base_percent: Decimal,
    pub gross_margin_percent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    HighDuty,
    HighLogistics,
    Low,
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureAssessment {
    pub exposure: Exposure,
    pub title: String,
    pub text: String,
    pub duty_share_percent: Decimal,
    pub freight_share_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub scenarios: Vec<StressScenario>,
    pub exposure: ExposureAssessment,
    pub margin_note: String,
}

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

/// Base, weak rand, high logistics and worst case re-pricing of `base`.
pub fn analyze_fx_freight_sensitivity(
    ctx: &CalcContext<'_>,
    base: &CalcInput,
) -> LandedCostResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base_output = calculate_landed_cost(ctx, base).ok_or_else(|| {
        LandedCostError::InsufficientData(format!(
            "No tariff rate for {} ({} -> {}) and no manual duty rate",
            base.hs6, base.origin, base.dest
        ))
    })?;

    let shocks = [
        ("Base Case", Decimal::ZERO, Decimal::ZERO),
        ("Weak Rand (FX +10%)", FX_SHOCK, Decimal::ZERO),
        ("High Logistics (Freight +20%)", Decimal::ZERO, FREIGHT_SHOCK),
        ("Worst Case (Both)", FX_SHOCK, FREIGHT_SHOCK),
    ];

    let mut scenarios = Vec::with_capacity(shocks.len());
    for (label, fx_change, freight_change) in shocks {
        let output = if fx_change.is_zero() && freight_change.is_zero() {
            Some(base_output.clone())
        } else {
            calculate_landed_cost(ctx, &stressed_input(base, fx_change, freight_change))
        };
        let Some(output) = output else {
            warnings.push(format!("Scenario '{}' produced no result", label));
            continue;
        };

        let delta = output.landed_cost_total_zar - base_output.landed_cost_total_zar;
        let delta_pct = if base_output.landed_cost_total_zar.is_zero() {
            Decimal::ZERO
        } else {
            round_money(delta / base_output.landed_cost_total_zar * dec!(100))
        };

        scenarios.push(StressScenario {
            label: label.to_string(),
            fx_change,
            freight_change,
            landed_cost_total_zar: output.landed_cost_total_zar,
            landed_cost_per_unit_zar: output.landed_cost_per_unit_zar,
            delta_vs_base_zar: delta,
            delta_vs_base_percent: delta_pct,
            gross_margin_percent: output.gross_margin_percent,
        });
    }

    let output = SensitivityOutput {
        scenarios,
        exposure: assess_exposure(&base_output, base.freight_zar),
        margin_note: margin_note(base_output.gross_margin_percent).to_string(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "FX / Freight Stress Test",
        &serde_json::json!({
            "fx_shock": FX_SHOCK.to_string(),
            "freight_shock": FREIGHT_SHOCK.to_string(),
            "tariff_version": base_output.tariff_version_label,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Same foreign price at a weaker rand: invoice, freight and insurance all
/// scale with FX; freight additionally carries its own shock.
fn stressed_input(base: &CalcInput, fx_change: Rate, freight_change: Rate) -> CalcInput {
    let fx_mult = Decimal::ONE + fx_change;
    let freight_mult = Decimal::ONE + freight_change;
    CalcInput {
        fx_rate: base.fx_rate * fx_mult,
        invoice_value_zar: base.invoice_value_zar * fx_mult,
        freight_zar: base.freight_zar * fx_mult * freight_mult,
        insurance_zar: base.insurance_zar * fx_mult,
        ..base.clone()
    }
}

fn assess_exposure(base: &CalcOutput, freight_zar: Money) -> ExposureAssessment {
    let (duty_share, freight_share) = if base.landed_cost_total_zar > Decimal::ZERO {
        (
            round_money(base.duty_amount_zar / base.landed_cost_total_zar * dec!(100)),
            round_money(freight_zar / base.landed_cost_total_zar * dec!(100)),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let (exposure, title, text) = if duty_share > dec!(30) {
        (
            Exposure::HighDuty,
            "High Duty Exposure",
            format!(
                "Duties make up {}% of your cost. Duty is charged on the rand value, so a weakening rand hurts margins disproportionately.",
                duty_share.round()
            ),
        )
    } else if freight_share > dec!(25) {
        (
            Exposure::HighLogistics,
            "High Logistics Exposure",
            format!(
                "Freight accounts for {}% of your landed cost. Shipping line rate hikes hit hard; consider locking in forward freight agreements.",
                freight_share.round()
            ),
        )
    } else if duty_share < dec!(5) && freight_share < dec!(10) {
        (
            Exposure::Low,
            "Low Sensitivity",
            "Product value is the main cost driver. Logistics and duties have minimal impact, so focus on supplier price.".to_string(),
        )
    } else {
        (
            Exposure::Balanced,
            "Balanced Risk Profile",
            "Costs are split between logistics and duties. Monitor both FX and shipping rates.".to_string(),
        )
    };

    ExposureAssessment {
        exposure,
        title: title.to_string(),
        text,
        duty_share_percent: duty_share,
        freight_share_percent: freight_share,
    }
}

fn margin_note(gross_margin_percent: Decimal) -> &'static str {
    if gross_margin_percent < dec!(10) {
        "A 5% freight increase likely turns this scenario unprofitable."
    } else if gross_margin_percent < dec!(20) {
        "Margin is moderate; monitor freight and classification changes."
    } else {
        "Scenario has buffer, but still track FX and tariff updates."
    }
}
