use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

use landed_cost_core::calc::reverse::analyze_max_purchase_price;
use landed_cost_core::calc::{base_input, CalcInput};
use landed_cost_core::types::with_metadata;

use super::{read_request, ShipmentFlags, Workspace};

/// Arguments for the maximum purchase price search
#[derive(Args)]
pub struct MaxPriceArgs {
    /// Path to JSON/YAML request file with targets and base shipment
    #[arg(long)]
    pub input: Option<String>,

    /// Target selling price per unit in ZAR
    #[arg(long)]
    pub target_price: Option<Decimal>,

    /// Target gross margin in percent
    #[arg(long)]
    pub target_margin: Option<Decimal>,

    #[command(flatten)]
    pub shipment: ShipmentFlags,
}

#[derive(Deserialize)]
struct MaxPriceRequest {
    target_selling_price_zar: Decimal,
    target_margin_percent: Decimal,
    base: CalcInput,
}

pub fn run_max_price(args: MaxPriceArgs, ws: &Workspace) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request = match read_request::<MaxPriceRequest>(args.input.as_deref())? {
        Some(request) => request,
        None => MaxPriceRequest {
            target_selling_price_zar: args
                .target_price
                .ok_or("--target-price is required (or provide --input)")?,
            target_margin_percent: args
                .target_margin
                .ok_or("--target-margin is required (or provide --input)")?,
            base: args.shipment.apply(base_input()),
        },
    };

    let result = analyze_max_purchase_price(
        &ws.context(),
        request.target_selling_price_zar,
        request.target_margin_percent,
        &request.base,
    );
    let warnings = result.warnings.clone();
    let envelope = with_metadata(
        "Bisection on per-unit purchase price against the forward waterfall",
        &request.base,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(envelope)?)
}
