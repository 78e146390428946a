use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tariff::TariffVersion;
use crate::types::{ConfidenceLabel, Money, Rate};

/// Identity of a breakdown line. The fixed lines come from the waterfall;
/// product modules contribute keyed extras.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineId {
    Duty,
    Vat,
    Levies,
    /// Port and terminal handling.
    Shipping,
    /// Clearing agent.
    Agency,
    /// Demurrage risk.
    Risk,
    /// Manual fees.
    Fees,
    ProductExtra(String),
}

impl LineId {
    /// Whether this line is part of `total_taxes_zar`.
    pub fn is_tax(&self) -> bool {
        matches!(self, LineId::Duty | LineId::Vat | LineId::Levies)
    }
}

/// A value recorded in an audit trail: a number or a code such as a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditValue {
    Amount(Decimal),
    Text(String),
}

impl From<Decimal> for AuditValue {
    fn from(value: Decimal) -> Self {
        AuditValue::Amount(value)
    }
}

impl From<&str> for AuditValue {
    fn from(value: &str) -> Self {
        AuditValue::Text(value.to_string())
    }
}

/// How a line was derived, stamped with the tariff version in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub formula: String,
    pub values_used: BTreeMap<String, AuditValue>,
    pub rates_applied: BTreeMap<String, Rate>,
    pub tariff_version_label: String,
    pub effective_date: NaiveDate,
    pub source_pointer_short: String,
}

impl AuditTrail {
    pub fn new(
        version: &TariffVersion,
        formula: &str,
        values_used: BTreeMap<String, AuditValue>,
        rates_applied: BTreeMap<String, Rate>,
    ) -> Self {
        AuditTrail {
            formula: formula.to_string(),
            values_used,
            rates_applied,
            tariff_version_label: version.label.clone(),
            effective_date: version.effective_date,
            source_pointer_short: version.source_pointer_short.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub id: LineId,
    pub label: String,
    pub amount_zar: Money,
    pub audit: AuditTrail,
}

/// Result of the forward waterfall. Every monetary field is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcOutput {
    pub customs_value_zar: Money,
    pub duty_amount_zar: Money,
    pub vat_amount_zar: Money,
    pub levy_amount_zar: Money,
    /// duty + VAT + levies
    pub total_taxes_zar: Money,
    pub agency_fee_zar: Money,
    pub port_charges_zar: Money,
    pub demurrage_zar: Money,
    pub product_extras_zar: Money,
    pub other_fees_zar: Money,
    /// Summed from unrounded components and rounded once, so it can differ
    /// from the sum of the rounded fields above by a few cents (at most half
    /// a cent per rounded component: customs value, fees, three taxes,
    /// agency, port, demurrage, extras).
    pub landed_cost_total_zar: Money,
    pub landed_cost_per_unit_zar: Money,
    pub gross_margin_percent: Decimal,
    pub verdict: String,
    pub confidence_label: ConfidenceLabel,
    pub warnings: Vec<String>,
    pub breakdown: Vec<BreakdownLine>,
    pub tariff_version_label: String,
    pub effective_date: NaiveDate,
    pub source_pointer_short: String,
}

impl CalcOutput {
    pub fn line(&self, id: &LineId) -> Option<&BreakdownLine> {
        self.breakdown.iter().find(|line| &line.id == id)
    }
}
