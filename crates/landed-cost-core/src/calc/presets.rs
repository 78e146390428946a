use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::engine::{calculate_landed_cost, CalcContext};
use super::input::CalcInput;
use super::output::CalcOutput;
use crate::types::Money;

/// Fixed invoice-value tiers for side-by-side comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetTier {
    R10k,
    R50k,
    R250k,
}

impl PresetTier {
    /// Ascending by invoice value.
    pub const ALL: [PresetTier; 3] = [PresetTier::R10k, PresetTier::R50k, PresetTier::R250k];

    pub fn invoice_value_zar(&self) -> Money {
        match self {
            PresetTier::R10k => dec!(10000),
            PresetTier::R50k => dec!(50000),
            PresetTier::R250k => dec!(250000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub id: PresetTier,
    pub invoice_value_zar: Money,
    pub output: CalcOutput,
}

/// Re-run the waterfall at each tier's invoice value. Tiers with no result
/// are dropped.
pub fn compute_scenario_presets(ctx: &CalcContext<'_>, base: &CalcInput) -> Vec<ScenarioPreset> {
    PresetTier::ALL
        .iter()
        .filter_map(|tier| {
            let invoice_value_zar = tier.invoice_value_zar();
            calculate_landed_cost(ctx, &base.with_invoice_value(invoice_value_zar)).map(|output| {
                ScenarioPreset {
                    id: *tier,
                    invoice_value_zar,
                    output,
                }
            })
        })
        .collect()
}
