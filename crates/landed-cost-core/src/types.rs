use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values, in destination currency (ZAR). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.15 = 15%). Never as percentages.
pub type Rate = Decimal;

/// Round a monetary amount to cents, half away from zero.
///
/// Every amount that leaves the engine passes through here, and a few
/// intermediate estimates (port charge, agency fee) are rounded before
/// they feed the VAT base.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Trade term governing who carries freight and insurance to the border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Incoterm {
    #[default]
    FOB,
    CIF,
    DDP,
}

/// How the consignment arrives; drives port charges and demurrage rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippingMode {
    #[serde(rename = "AIR")]
    Air,
    #[default]
    #[serde(rename = "LCL")]
    Lcl,
    #[serde(rename = "FCL_20")]
    Fcl20,
    #[serde(rename = "FCL_40")]
    Fcl40,
}

impl ShippingMode {
    pub fn code(&self) -> &'static str {
        match self {
            ShippingMode::Air => "AIR",
            ShippingMode::Lcl => "LCL",
            ShippingMode::Fcl20 => "FCL_20",
            ShippingMode::Fcl40 => "FCL_40",
        }
    }
}

/// South African ports of entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortOfEntry {
    /// Durban
    #[default]
    DBN,
    /// Cape Town
    CPT,
    /// Johannesburg (OR Tambo, air cargo)
    JNB,
    /// Port Elizabeth / Gqeberha
    PLZ,
}

impl PortOfEntry {
    pub fn code(&self) -> &'static str {
        match self {
            PortOfEntry::DBN => "DBN",
            PortOfEntry::CPT => "CPT",
            PortOfEntry::JNB => "JNB",
            PortOfEntry::PLZ => "PLZ",
        }
    }
}

/// How much the caller should trust a computed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
