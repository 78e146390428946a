use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::products::ProductData;
use crate::types::{Incoterm, Money, PortOfEntry, Rate, ShippingMode};

/// HS-classification confidence assumed when the caller supplies none.
pub const DEFAULT_HS_CONFIDENCE: Decimal = dec!(0.8);

/// A fully specified shipment. Monetary fields are already in destination
/// currency (ZAR); `fx_rate` records the conversion the caller used.
///
/// The engine treats this as an immutable value: product-module enrichment
/// produces a new copy, the caller's input is never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcInput {
    /// Six-digit Harmonized System code.
    pub hs6: String,
    /// Origin country slug, e.g. `china`.
    pub origin: String,
    /// Destination country slug, e.g. `south-africa`.
    pub dest: String,
    pub incoterm: Incoterm,
    pub invoice_value_zar: Money,
    pub freight_zar: Money,
    pub insurance_zar: Money,
    /// Manually entered fees (clearing, inspection, ...).
    pub other_fees_zar: Money,
    pub quantity: u32,
    pub importer_is_vat_vendor: bool,
    pub selling_price_per_unit_zar: Money,
    pub fx_rate: Decimal,
    /// Confidence in the HS classification, 0..=1.
    #[serde(default)]
    pub hs_confidence: Option<Rate>,
    /// Keep freight and insurance in customs value even under CIF.
    #[serde(default)]
    pub override_cif_freight_insurance: bool,
    /// Duty rate to use when no tariff rate is seeded for the route.
    #[serde(default)]
    pub custom_duty_rate: Option<Rate>,
    #[serde(default)]
    pub port_of_entry: Option<PortOfEntry>,
    #[serde(default)]
    pub shipping_mode: Option<ShippingMode>,
    /// Estimate the clearing agent's fee instead of relying on `other_fees_zar`.
    #[serde(default)]
    pub use_agency_estimate: bool,
    /// Expected container dwell at port, in days.
    #[serde(default)]
    pub risk_demurrage_days: Option<u32>,
    /// FX volatility buffer in percent (5 = +5% on foreign-priced values).
    #[serde(default)]
    pub risk_forex_buffer_percent: Option<Decimal>,
    /// Free-form data consumed only by a matching product module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_data: Option<ProductData>,
}

impl CalcInput {
    /// Quantity floored at one, as a Decimal divisor.
    pub fn effective_quantity(&self) -> Decimal {
        Decimal::from(self.quantity.max(1))
    }

    pub fn shipping_mode_or_default(&self) -> ShippingMode {
        self.shipping_mode.unwrap_or_default()
    }

    pub fn port_of_entry_or_default(&self) -> PortOfEntry {
        self.port_of_entry.unwrap_or_default()
    }

    pub fn demurrage_days(&self) -> u32 {
        self.risk_demurrage_days.unwrap_or(0)
    }

    pub fn forex_buffer_percent(&self) -> Decimal {
        self.risk_forex_buffer_percent.unwrap_or(Decimal::ZERO)
    }

    pub fn hs_confidence_or_default(&self) -> Rate {
        self.hs_confidence.unwrap_or(DEFAULT_HS_CONFIDENCE)
    }

    /// Copy of this input with a different invoice value.
    pub fn with_invoice_value(&self, invoice_value_zar: Money) -> CalcInput {
        CalcInput {
            invoice_value_zar,
            ..self.clone()
        }
    }
}

/// The canonical shipment: 100 PV modules from China into Durban, LCL.
pub fn base_input() -> CalcInput {
    CalcInput {
        hs6: "854140".into(),
        origin: "china".into(),
        dest: "south-africa".into(),
        incoterm: Incoterm::FOB,
        invoice_value_zar: dec!(50000),
        freight_zar: dec!(6000),
        insurance_zar: dec!(900),
        other_fees_zar: Decimal::ZERO,
        quantity: 100,
        importer_is_vat_vendor: true,
        selling_price_per_unit_zar: dec!(900),
        fx_rate: dec!(18.2),
        hs_confidence: Some(dec!(0.9)),
        override_cif_freight_insurance: false,
        custom_duty_rate: None,
        port_of_entry: Some(PortOfEntry::DBN),
        shipping_mode: Some(ShippingMode::Lcl),
        use_agency_estimate: true,
        risk_demurrage_days: Some(0),
        risk_forex_buffer_percent: Some(Decimal::ZERO),
        product_data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_quantity_floors_at_one() {
        let mut input = base_input();
        input.quantity = 0;
        assert_eq!(input.effective_quantity(), Decimal::ONE);
        input.quantity = 25;
        assert_eq!(input.effective_quantity(), dec!(25));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "hs6": "854140",
            "origin": "china",
            "dest": "south-africa",
            "incoterm": "CIF",
            "invoice_value_zar": "10000",
            "freight_zar": "0",
            "insurance_zar": "0",
            "other_fees_zar": "0",
            "quantity": 10,
            "importer_is_vat_vendor": false,
            "selling_price_per_unit_zar": "1500",
            "fx_rate": "18.2"
        }"#;
        let input: CalcInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.incoterm, Incoterm::CIF);
        assert_eq!(input.shipping_mode_or_default(), ShippingMode::Lcl);
        assert_eq!(input.port_of_entry_or_default(), PortOfEntry::DBN);
        assert_eq!(input.hs_confidence_or_default(), DEFAULT_HS_CONFIDENCE);
        assert_eq!(input.demurrage_days(), 0);
        assert!(!input.use_agency_estimate);
        assert!(input.product_data.is_none());
    }

    #[test]
    fn test_with_invoice_value_leaves_original_untouched() {
        let input = base_input();
        let scaled = input.with_invoice_value(dec!(250000));
        assert_eq!(scaled.invoice_value_zar, dec!(250000));
        assert_eq!(input.invoice_value_zar, dec!(50000));
    }
}
