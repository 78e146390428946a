pub mod landed;
pub mod reverse;
pub mod scenarios;
pub mod tariffs;

use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use landed_cost_core::calc::{base_input, CalcContext, CalcInput};
use landed_cost_core::products::{ProductData, ProductRegistry};
use landed_cost_core::tariff::fixtures::seeded_repository;
use landed_cost_core::tariff::{InMemoryTariffRepository, TariffTable};
use landed_cost_core::types::{Incoterm, PortOfEntry, ShippingMode};

use crate::input;

/// Tariff data and product modules the commands calculate against.
pub struct Workspace {
    pub tariffs: InMemoryTariffRepository,
    pub products: ProductRegistry,
}

impl Workspace {
    /// Load the tariff table at `path`, or the built-in seed table when absent.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let tariffs = match path {
            Some(path) => {
                let table: TariffTable = input::file::read_structured(path)?;
                debug!(path, version = %table.version.id, rows = table.rates.len(), "loaded tariff table");
                InMemoryTariffRepository::from_table(table)?
            }
            None => seeded_repository()?,
        };
        Ok(Workspace {
            tariffs,
            products: ProductRegistry::builtin(),
        })
    }

    pub fn context(&self) -> CalcContext<'_> {
        CalcContext::new(&self.tariffs, &self.products)
    }
}

/// Shipment flags layered over the built-in example shipment.
#[derive(Args, Debug, Default)]
pub struct ShipmentFlags {
    /// Six-digit HS code
    #[arg(long)]
    pub hs6: Option<String>,

    /// Origin country slug (e.g. china)
    #[arg(long)]
    pub origin: Option<String>,

    /// Destination country slug (e.g. south-africa)
    #[arg(long)]
    pub dest: Option<String>,

    /// Incoterm: FOB, CIF or DDP
    #[arg(long, value_parser = parse_code::<Incoterm>)]
    pub incoterm: Option<Incoterm>,

    /// Supplier invoice value in ZAR
    #[arg(long)]
    pub invoice: Option<Decimal>,

    /// Freight in ZAR
    #[arg(long)]
    pub freight: Option<Decimal>,

    /// Insurance in ZAR
    #[arg(long)]
    pub insurance: Option<Decimal>,

    /// Other fees in ZAR
    #[arg(long)]
    pub other_fees: Option<Decimal>,

    /// Units in the shipment
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Importer is not registered for VAT
    #[arg(long)]
    pub non_vat_vendor: bool,

    /// Expected selling price per unit in ZAR
    #[arg(long)]
    pub selling_price: Option<Decimal>,

    /// FX rate used to convert supplier prices
    #[arg(long)]
    pub fx_rate: Option<Decimal>,

    /// HS classification confidence (0 to 1)
    #[arg(long)]
    pub hs_confidence: Option<Decimal>,

    /// Keep freight and insurance in customs value under CIF
    #[arg(long)]
    pub override_cif: bool,

    /// Duty rate to apply when no tariff rate is on file (e.g. 0.2)
    #[arg(long)]
    pub duty_rate: Option<Decimal>,

    /// Port of entry: DBN, CPT, JNB or PLZ
    #[arg(long, value_parser = parse_code::<PortOfEntry>)]
    pub port: Option<PortOfEntry>,

    /// Shipping mode: AIR, LCL, FCL_20 or FCL_40
    #[arg(long, value_parser = parse_code::<ShippingMode>)]
    pub mode: Option<ShippingMode>,

    /// Do not estimate the clearing agent's fee
    #[arg(long)]
    pub no_agency_estimate: bool,

    /// Expected days at port
    #[arg(long)]
    pub demurrage_days: Option<u32>,

    /// FX volatility buffer in percent
    #[arg(long)]
    pub forex_buffer: Option<Decimal>,

    /// Product module field as key=value (repeatable, value parsed as JSON when possible)
    #[arg(long = "product-field", value_parser = parse_product_field)]
    pub product_fields: Vec<(String, Value)>,
}

impl ShipmentFlags {
    /// Apply every flag that was given on top of `base`.
    pub fn apply(&self, base: CalcInput) -> CalcInput {
        let mut input = base;
        if let Some(hs6) = &self.hs6 {
            input.hs6 = hs6.clone();
        }
        if let Some(origin) = &self.origin {
            input.origin = origin.clone();
        }
        if let Some(dest) = &self.dest {
            input.dest = dest.clone();
        }
        if let Some(incoterm) = self.incoterm {
            input.incoterm = incoterm;
        }
        if let Some(invoice) = self.invoice {
            input.invoice_value_zar = invoice;
        }
        if let Some(freight) = self.freight {
            input.freight_zar = freight;
        }
        if let Some(insurance) = self.insurance {
            input.insurance_zar = insurance;
        }
        if let Some(fees) = self.other_fees {
            input.other_fees_zar = fees;
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        if self.non_vat_vendor {
            input.importer_is_vat_vendor = false;
        }
        if let Some(price) = self.selling_price {
            input.selling_price_per_unit_zar = price;
        }
        if let Some(fx) = self.fx_rate {
            input.fx_rate = fx;
        }
        if self.hs_confidence.is_some() {
            input.hs_confidence = self.hs_confidence;
        }
        if self.override_cif {
            input.override_cif_freight_insurance = true;
        }
        if self.duty_rate.is_some() {
            input.custom_duty_rate = self.duty_rate;
        }
        if self.port.is_some() {
            input.port_of_entry = self.port;
        }
        if self.mode.is_some() {
            input.shipping_mode = self.mode;
        }
        if self.no_agency_estimate {
            input.use_agency_estimate = false;
        }
        if self.demurrage_days.is_some() {
            input.risk_demurrage_days = self.demurrage_days;
        }
        if self.forex_buffer.is_some() {
            input.risk_forex_buffer_percent = self.forex_buffer;
        }
        if !self.product_fields.is_empty() {
            let data = input.product_data.get_or_insert_with(ProductData::new);
            for (key, value) in &self.product_fields {
                data.insert(key.clone(), value.clone());
            }
        }
        input
    }
}

/// Resolve a command's request: `--input` file, then piped stdin, then flags.
pub fn read_request<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_structured(path)?));
    }
    input::stdin::read_piped()
}

/// Shipment from `--input`/stdin, or the example shipment with flags applied.
pub fn resolve_shipment(
    path: Option<&str>,
    flags: &ShipmentFlags,
) -> Result<CalcInput, Box<dyn std::error::Error>> {
    match read_request::<CalcInput>(path)? {
        Some(input) => Ok(input),
        None => Ok(flags.apply(base_input())),
    }
}

/// Parse an upper-case code such as `FCL_20` into its serde representation.
fn parse_code<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(s.trim().to_uppercase()))
        .map_err(|_| format!("unrecognised value '{}'", s))
}

fn parse_product_field(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse_code::<Incoterm>("cif").unwrap(), Incoterm::CIF);
        assert_eq!(parse_code::<ShippingMode>("fcl_40").unwrap(), ShippingMode::Fcl40);
        assert_eq!(parse_code::<PortOfEntry>("CPT").unwrap(), PortOfEntry::CPT);
        assert!(parse_code::<PortOfEntry>("LAX").is_err());
    }

    #[test]
    fn test_parse_product_field() {
        assert_eq!(
            parse_product_field("voltage=48").unwrap(),
            ("voltage".to_string(), serde_json::json!(48))
        );
        assert_eq!(
            parse_product_field("chemistry=LFP").unwrap(),
            ("chemistry".to_string(), Value::String("LFP".into()))
        );
        assert!(parse_product_field("novalue").is_err());
    }

    #[test]
    fn test_flags_override_example_shipment() {
        let flags = ShipmentFlags {
            hs6: Some("850760".into()),
            invoice: Some(dec!(120000)),
            non_vat_vendor: true,
            mode: Some(ShippingMode::Fcl20),
            product_fields: vec![("voltage".into(), serde_json::json!(24))],
            ..Default::default()
        };
        let input = flags.apply(base_input());
        assert_eq!(input.hs6, "850760");
        assert_eq!(input.invoice_value_zar, dec!(120000));
        assert!(!input.importer_is_vat_vendor);
        assert_eq!(input.shipping_mode, Some(ShippingMode::Fcl20));
        assert_eq!(input.product_data.unwrap()["voltage"], serde_json::json!(24));
        // Untouched fields keep the example values
        assert_eq!(input.origin, "china");
        assert_eq!(input.quantity, 100);
    }

    fn demo(name: &str) -> String {
        format!("{}/../../demos/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn test_demo_tariff_yaml_loads() {
        use landed_cost_core::tariff::TariffRepository;

        let ws = Workspace::load(Some(&demo("tariffs.yaml"))).unwrap();
        assert_eq!(ws.tariffs.tariff_version().label, "SARS-TARIFF-2026.04");
        // The superseded tv-2026-02 row is skipped
        assert_eq!(ws.tariffs.len(), 3);
        assert!(ws.tariffs.tariff_rate("854140", "vietnam", "south-africa").is_some());
    }

    #[test]
    fn test_demo_shipment_calculates() {
        let ws = Workspace::load(None).unwrap();
        let input = resolve_shipment(Some(&demo("shipment.json")), &ShipmentFlags::default()).unwrap();
        let output = landed_cost_core::calc::calculate_landed_cost(&ws.context(), &input).unwrap();
        assert!(output
            .breakdown
            .iter()
            .any(|line| line.label.to_lowercase().contains("dangerous")));
    }

    #[test]
    fn test_seed_workspace_loads() {
        let ws = Workspace::load(None).unwrap();
        assert!(!ws.tariffs.is_empty());
        assert!(!ws.products.modules().is_empty());
    }
}
