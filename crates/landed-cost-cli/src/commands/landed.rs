use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use landed_cost_core::calc::{calculate_landed_cost, CalcInput, CalcOutput};
use landed_cost_core::products::MetricValue;
use landed_cost_core::types::with_metadata;

use super::{resolve_shipment, ShipmentFlags, Workspace};

/// Arguments for a forward landed-cost calculation
#[derive(Args)]
pub struct CalcArgs {
    /// Path to JSON/YAML shipment file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub shipment: ShipmentFlags,
}

#[derive(Serialize)]
struct CalcReport {
    #[serde(flatten)]
    output: CalcOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    product_metrics: Vec<MetricValue>,
}

pub fn run_calc(args: CalcArgs, ws: &Workspace) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = resolve_shipment(args.input.as_deref(), &args.shipment)?;
    let ctx = ws.context();

    let output = calculate_landed_cost(&ctx, &input).ok_or_else(|| no_rate_message(&input))?;

    let product_metrics = match ctx.products.find(&input.hs6) {
        Some(module) => module.evaluate_metrics(
            &output,
            input.product_data.as_ref().unwrap_or(&Default::default()),
        ),
        None => Vec::new(),
    };

    let warnings = output.warnings.clone();
    let report = CalcReport {
        output,
        product_metrics,
    };
    let envelope = with_metadata(
        "Landed cost waterfall: customs value, duty, levies, VAT, logistics, risk",
        &input,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(envelope)?)
}

pub(crate) fn no_rate_message(input: &CalcInput) -> String {
    format!(
        "No tariff rate for HS {} ({} -> {}); pass --duty-rate to estimate with a manual rate",
        input.hs6, input.origin, input.dest
    )
}
