use clap::Args;
use serde_json::Value;
use std::time::Instant;

use landed_cost_core::calc::presets::compute_scenario_presets;
use landed_cost_core::calc::sensitivity::analyze_fx_freight_sensitivity;
use landed_cost_core::types::with_metadata;

use super::landed::no_rate_message;
use super::{resolve_shipment, ShipmentFlags, Workspace};

/// Arguments for the invoice-tier presets
#[derive(Args)]
pub struct PresetsArgs {
    /// Path to JSON/YAML shipment file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub shipment: ShipmentFlags,
}

pub fn run_presets(args: PresetsArgs, ws: &Workspace) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let base = resolve_shipment(args.input.as_deref(), &args.shipment)?;

    let presets = compute_scenario_presets(&ws.context(), &base);
    if presets.is_empty() {
        return Err(no_rate_message(&base).into());
    }

    let envelope = with_metadata(
        "Forward waterfall re-run at fixed invoice tiers",
        &base,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        presets,
    );
    Ok(serde_json::to_value(envelope)?)
}

/// Arguments for the FX and freight stress test
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML shipment file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub shipment: ShipmentFlags,
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    ws: &Workspace,
) -> Result<Value, Box<dyn std::error::Error>> {
    let base = resolve_shipment(args.input.as_deref(), &args.shipment)?;
    let result = analyze_fx_freight_sensitivity(&ws.context(), &base)?;
    Ok(serde_json::to_value(result)?)
}
