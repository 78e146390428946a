//! Confidence label, verdict text and advisory warnings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::charges::excess_demurrage_days;
use super::input::CalcInput;
use crate::types::ConfidenceLabel;

const HIGH_CONFIDENCE_MIN: Decimal = dec!(0.9);
const MEDIUM_CONFIDENCE_MIN: Decimal = dec!(0.75);

pub const VERDICT_HEADROOM: &str = "Likely profitable with headroom";
pub const VERDICT_VIABLE: &str = "Potentially viable, monitor cost and compliance risk";
pub const VERDICT_THIN: &str = "Thin margin: likely not viable without renegotiation";

pub const WARNING_CIF_DOUBLE_COUNT: &str =
    "CIF selected: freight and insurance fields ignored to prevent double counting.";
pub const WARNING_NON_VAT_VENDOR: &str = "Non-vendor importer: VAT may be immediate cash outflow.";
pub const WARNING_MANUAL_DUTY_RATE: &str =
    "No tariff rate on file for this route: manual duty rate applied with default 15% VAT.";

/// Classification confidence combined with how many cost inputs were left
/// at zero. A route without a resolved tariff rate is always low.
pub fn confidence_label(input: &CalcInput, rate_resolved: bool) -> ConfidenceLabel {
    if !rate_resolved {
        return ConfidenceLabel::Low;
    }
    let hs_confidence = input.hs_confidence_or_default();
    let zero_assumptions =
        usize::from(input.freight_zar.is_zero()) + usize::from(input.insurance_zar.is_zero());

    if hs_confidence >= HIGH_CONFIDENCE_MIN && zero_assumptions <= 1 {
        ConfidenceLabel::High
    } else if hs_confidence >= MEDIUM_CONFIDENCE_MIN {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    }
}

pub fn verdict(gross_margin_percent: Decimal) -> &'static str {
    if gross_margin_percent >= dec!(25) {
        VERDICT_HEADROOM
    } else if gross_margin_percent >= dec!(10) {
        VERDICT_VIABLE
    } else {
        VERDICT_THIN
    }
}

/// Advisory notes, in a fixed order. None of them block the calculation.
pub fn warnings(input: &CalcInput, freight_excluded: bool, manual_rate: bool) -> Vec<String> {
    let mut warnings = Vec::new();

    if freight_excluded {
        warnings.push(WARNING_CIF_DOUBLE_COUNT.to_string());
    }
    if !input.importer_is_vat_vendor {
        warnings.push(WARNING_NON_VAT_VENDOR.to_string());
    }
    let buffer = input.forex_buffer_percent();
    if buffer > Decimal::ZERO {
        warnings.push(format!(
            "Risk: Applied {}% Forex volatility buffer.",
            buffer.normalize()
        ));
    }
    let excess_days = excess_demurrage_days(input.demurrage_days());
    if excess_days > 0 {
        warnings.push(format!("Risk: Including {} days demurrage.", excess_days));
    }
    if manual_rate {
        warnings.push(WARNING_MANUAL_DUTY_RATE.to_string());
    }

    warnings
}
