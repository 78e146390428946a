//! Per-product plug-ins.
//!
//! A [`ProductModule`] is a plain capability record: an HS6 predicate, the
//! extra inputs it understands, the business metrics it derives, and two
//! optional hooks into the waterfall. Modules are looked up once per
//! calculation through a [`ProductRegistry`]; first match wins.

#[cfg(feature = "products")]
pub mod lithium;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::calc::input::CalcInput;
use crate::calc::output::{AuditValue, CalcOutput};
use crate::types::{round_money, Money, Rate};

/// Free-form per-product inputs, keyed by field id.
pub type ProductData = BTreeMap<String, serde_json::Value>;

pub type MatchFn = fn(&str) -> bool;
pub type EnrichFn = fn(&CalcInput, &ProductData) -> CalcInput;
pub type ExtrasFn = fn(&ProductData) -> Vec<ExtraCharge>;
pub type MetricFn = fn(&CalcOutput, &ProductData) -> Decimal;

// ---------------------------------------------------------------------------
// Capability records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Select,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// An extra structured input a product module accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Currency,
    Percent,
    Number,
}

/// A derived business metric, a pure function of the output and the
/// product inputs.
#[derive(Clone)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub format: MetricFormat,
    pub calculate: MetricFn,
}

impl fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("format", &self.format)
            .finish()
    }
}

/// Evaluated metric, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub id: String,
    pub label: String,
    pub format: MetricFormat,
    pub value: Decimal,
}

/// An extra cost line contributed by a product module. The engine stamps it
/// with the active tariff version when it becomes a breakdown line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraCharge {
    pub key: String,
    pub label: String,
    pub amount_zar: Money,
    pub formula: String,
    pub values_used: BTreeMap<String, AuditValue>,
    pub rates_applied: BTreeMap<String, Rate>,
}

#[derive(Clone)]
pub struct ProductModule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub matches: MatchFn,
    pub fields: Vec<FieldDefinition>,
    pub metrics: Vec<MetricDefinition>,
    pub enrich_inputs: Option<EnrichFn>,
    pub calculate_extras: Option<ExtrasFn>,
}

impl fmt::Debug for ProductModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductModule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("metrics", &self.metrics)
            .field("enrich_inputs", &self.enrich_inputs.is_some())
            .field("calculate_extras", &self.calculate_extras.is_some())
            .finish()
    }
}

impl ProductModule {
    /// Fill any field the caller left out with the field's declared default.
    pub fn with_field_defaults(&self, data: &ProductData) -> ProductData {
        let mut filled = data.clone();
        for field in &self.fields {
            if let Some(default) = &field.default_value {
                filled
                    .entry(field.id.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        filled
    }

    pub fn evaluate_metrics(&self, output: &CalcOutput, data: &ProductData) -> Vec<MetricValue> {
        let data = self.with_field_defaults(data);
        self.metrics
            .iter()
            .map(|metric| MetricValue {
                id: metric.id.to_string(),
                label: metric.label.to_string(),
                format: metric.format,
                value: round_money((metric.calculate)(output, &data)),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ProductRegistry {
    modules: Vec<ProductModule>,
}

impl ProductRegistry {
    pub fn empty() -> Self {
        ProductRegistry::default()
    }

    /// Registry with every module compiled into this build.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = ProductRegistry::empty();
        #[cfg(feature = "products")]
        {
            registry = registry.register(lithium::lithium_batteries());
        }
        registry
    }

    pub fn register(mut self, module: ProductModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn find(&self, hs6: &str) -> Option<&ProductModule> {
        self.modules.iter().find(|m| (m.matches)(hs6))
    }

    pub fn modules(&self) -> &[ProductModule] {
        &self.modules
    }
}

// ---------------------------------------------------------------------------
// Lenient accessors over the data bag
// ---------------------------------------------------------------------------

/// Numeric value of a field; strings are parsed, booleans count as 0/1,
/// anything else is zero.
pub fn data_number(data: &ProductData, key: &str) -> Decimal {
    match data.get(key) {
        Some(serde_json::Value::Number(n)) => {
            Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .unwrap_or(Decimal::ZERO)
        }
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        Some(serde_json::Value::Bool(b)) => {
            if *b {
                Decimal::ONE
            } else {
                Decimal::ZERO
            }
        }
        _ => Decimal::ZERO,
    }
}

/// Truthiness of a field.
pub fn data_flag(data: &ProductData, key: &str) -> bool {
    match data.get(key) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(_)) => !data_number(data, key).is_zero(),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && s != "false" && s != "0"
        }
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}
