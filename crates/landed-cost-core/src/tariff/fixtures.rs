//! Seed tariff data: the SARS February 2026 schedule for the routes the
//! engine ships with.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::repository::{InMemoryTariffRepository, TariffRate, TariffTable, TariffVersion};
use crate::types::Rate;
use crate::LandedCostResult;

pub const SEED_VERSION_ID: &str = "tv-2026-02";
pub const SOUTH_AFRICA: &str = "south-africa";

pub fn seed_version() -> TariffVersion {
    TariffVersion {
        id: SEED_VERSION_ID.into(),
        label: "SARS-TARIFF-2026.02".into(),
        effective_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default(),
        source_pointer_short: "SARS customs schedule + VAT guide".into(),
    }
}

fn za_rate(hs6: &str, origin: &str, duty_rate: Rate, levies: &[(&str, Rate)]) -> TariffRate {
    TariffRate {
        tariff_version_id: SEED_VERSION_ID.into(),
        hs6: hs6.into(),
        origin_slug: origin.into(),
        dest_slug: SOUTH_AFRICA.into(),
        duty_rate,
        vat_rate: dec!(0.15),
        levies: levies
            .iter()
            .map(|(name, rate)| (name.to_string(), *rate))
            .collect::<BTreeMap<_, _>>(),
    }
}

pub fn seed_table() -> TariffTable {
    TariffTable {
        version: seed_version(),
        rates: vec![
            // Photovoltaic cells and modules
            za_rate("854140", "china", dec!(0.10), &[]),
            // Lithium-ion accumulators
            za_rate("850760", "china", dec!(0.15), &[("environmental", dec!(0.01))]),
            // Lamps and lighting fittings
            za_rate("940540", "china", dec!(0.20), &[]),
            // AC motors, multi-phase, 750 W to 75 kW
            za_rate("850152", "china", dec!(0.10), &[]),
            za_rate("854140", "india", dec!(0.10), &[]),
        ],
    }
}

/// Repository over the seed table.
pub fn seeded_repository() -> LandedCostResult<InMemoryTariffRepository> {
    InMemoryTariffRepository::from_table(seed_table())
}
