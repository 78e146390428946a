mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use commands::landed::CalcArgs;
use commands::reverse::MaxPriceArgs;
use commands::scenarios::{PresetsArgs, SensitivityArgs};
use commands::tariffs::TariffsArgs;
use commands::Workspace;
use landed_cost_core::tariff::TariffRepository;

/// Import landed cost and maximum purchase price calculations
#[derive(Parser)]
#[command(
    name = "landed",
    version,
    about = "Import landed cost and maximum purchase price calculations",
    long_about = "A CLI for estimating the full cost of importing goods into South Africa \
                  with decimal precision. Computes customs value, duty, levies, VAT, \
                  clearing and port charges, demurrage and FX risk, and searches for the \
                  highest supplier price that still meets a target margin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Tariff table file (JSON or YAML); defaults to the built-in table
    #[arg(long, global = true, env = "LANDED_TARIFFS")]
    tariffs: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the landed cost of a shipment
    Calc(CalcArgs),
    /// Find the maximum per-unit purchase price for a target margin
    MaxPrice(MaxPriceArgs),
    /// Landed cost at the R10k, R50k and R250k invoice tiers
    Presets(PresetsArgs),
    /// Stress the shipment with a weaker rand and higher freight
    Sensitivity(SensitivityArgs),
    /// Show the active tariff version and rates
    Tariffs(TariffsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Crate version, plus the tariff version when the table loads.
fn version_line(tariffs: Option<&str>) -> String {
    let version = format!("landed {}", env!("CARGO_PKG_VERSION"));
    match Workspace::load(tariffs) {
        Ok(ws) => format!("{} (tariffs {})", version, ws.tariffs.tariff_version().label),
        Err(e) => {
            warn!(error = %e, "tariff table unavailable");
            version
        }
    }
}

fn with_workspace(
    tariffs: Option<&str>,
    run: impl FnOnce(&Workspace) -> Result<Value, Box<dyn std::error::Error>>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let ws = Workspace::load(tariffs)?;
    run(&ws)
}

fn main() {
    let Cli {
        command,
        output: format,
        tariffs,
    } = Cli::parse();
    init_tracing();
    let tariffs = tariffs.as_deref();

    let result = match command {
        Commands::Version => {
            println!("{}", version_line(tariffs));
            return;
        }
        Commands::Calc(args) => with_workspace(tariffs, |ws| commands::landed::run_calc(args, ws)),
        Commands::MaxPrice(args) => {
            with_workspace(tariffs, |ws| commands::reverse::run_max_price(args, ws))
        }
        Commands::Presets(args) => {
            with_workspace(tariffs, |ws| commands::scenarios::run_presets(args, ws))
        }
        Commands::Sensitivity(args) => {
            with_workspace(tariffs, |ws| commands::scenarios::run_sensitivity(args, ws))
        }
        Commands::Tariffs(args) => {
            with_workspace(tariffs, |ws| commands::tariffs::run_tariffs(args, ws))
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
