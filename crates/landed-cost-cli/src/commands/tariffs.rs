use clap::Args;
use serde_json::{json, Value};

use landed_cost_core::tariff::{TariffRate, TariffRepository};

use super::Workspace;

/// Arguments for listing the active tariff table
#[derive(Args)]
pub struct TariffsArgs {
    /// Only show rates for this HS code
    #[arg(long)]
    pub hs6: Option<String>,

    /// Only show rates from this origin
    #[arg(long)]
    pub origin: Option<String>,
}

pub fn run_tariffs(args: TariffsArgs, ws: &Workspace) -> Result<Value, Box<dyn std::error::Error>> {
    let rates: Vec<&TariffRate> = ws
        .tariffs
        .rates()
        .into_iter()
        .filter(|rate| args.hs6.as_deref().map_or(true, |hs6| rate.hs6 == hs6))
        .filter(|rate| {
            args.origin
                .as_deref()
                .map_or(true, |origin| rate.origin_slug == origin)
        })
        .collect();

    Ok(json!({
        "version": ws.tariffs.tariff_version(),
        "rates": rates,
    }))
}
