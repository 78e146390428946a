pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar for a table cell or CSV field.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// A tariff rate's levies as `name=rate` pairs, e.g. `environmental=0.01`.
pub(crate) fn levies_cell(rate: &Value) -> String {
    match rate.get("levies") {
        Some(Value::Object(levies)) => levies
            .iter()
            .map(|(name, value)| format!("{}={}", name, cell(value)))
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

/// Fields of a calculation result worth a row of their own, in display order.
pub(crate) const SUMMARY_FIELDS: [&str; 14] = [
    "customs_value_zar",
    "duty_amount_zar",
    "levy_amount_zar",
    "vat_amount_zar",
    "total_taxes_zar",
    "agency_fee_zar",
    "port_charges_zar",
    "demurrage_zar",
    "product_extras_zar",
    "other_fees_zar",
    "landed_cost_total_zar",
    "landed_cost_per_unit_zar",
    "gross_margin_percent",
    "verdict",
];
