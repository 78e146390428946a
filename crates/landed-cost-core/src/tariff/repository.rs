//! Tariff data provider.
//!
//! The engine never reaches for global state: it reads rates through a
//! [`TariffRepository`] handed to it by the caller. [`InMemoryTariffRepository`]
//! is the process-local implementation, built once from a [`TariffTable`]
//! (seed fixtures or a file loaded by the CLI) and shared read-only.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::LandedCostError;
use crate::types::Rate;
use crate::LandedCostResult;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A dated snapshot of active duty/VAT/levy rates and its citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffVersion {
    pub id: String,
    pub label: String,
    pub effective_date: NaiveDate,
    pub source_pointer_short: String,
}

/// Duty, VAT and levy rates for one (HS6, origin, destination) key.
/// All rates are fractions of customs value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRate {
    pub tariff_version_id: String,
    pub hs6: String,
    pub origin_slug: String,
    pub dest_slug: String,
    pub duty_rate: Rate,
    pub vat_rate: Rate,
    /// Named ad valorem levies, e.g. `environmental -> 0.01`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub levies: BTreeMap<String, Rate>,
}

/// Serialisable form of a whole tariff data set: the active version plus
/// every rate row. Rows tagged with another version id are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffTable {
    pub version: TariffVersion,
    pub rates: Vec<TariffRate>,
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// Read-only lookup the engine performs once per calculation.
pub trait TariffRepository: Send + Sync {
    /// Resolve the active rate for a route, if one is seeded.
    fn tariff_rate(&self, hs6: &str, origin_slug: &str, dest_slug: &str) -> Option<&TariffRate>;

    /// The single active tariff version every result is stamped with.
    fn tariff_version(&self) -> &TariffVersion;
}

type RouteKey = (String, String, String);

/// Hash-indexed tariff table restricted to one active version.
#[derive(Debug, Clone)]
pub struct InMemoryTariffRepository {
    version: TariffVersion,
    rates: HashMap<RouteKey, TariffRate>,
}

impl InMemoryTariffRepository {
    /// Build a repository from a table, enforcing one rate per key.
    pub fn from_table(table: TariffTable) -> LandedCostResult<Self> {
        let TariffTable { version, rates } = table;
        let mut indexed = HashMap::with_capacity(rates.len());

        for (i, rate) in rates.into_iter().enumerate() {
            if rate.tariff_version_id != version.id {
                debug!(
                    hs6 = %rate.hs6,
                    version = %rate.tariff_version_id,
                    "skipping tariff rate from inactive version"
                );
                continue;
            }
            validate_rate(i, &rate)?;

            let key = (
                rate.hs6.clone(),
                rate.origin_slug.clone(),
                rate.dest_slug.clone(),
            );
            if indexed.contains_key(&key) {
                return Err(LandedCostError::DuplicateTariffRate {
                    hs6: rate.hs6,
                    origin: rate.origin_slug,
                    dest: rate.dest_slug,
                    version: version.id,
                });
            }
            indexed.insert(key, rate);
        }

        Ok(InMemoryTariffRepository {
            version,
            rates: indexed,
        })
    }

    /// Number of rates active under the current version.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Active rates sorted by (HS6, origin, destination).
    pub fn rates(&self) -> Vec<&TariffRate> {
        let mut rates: Vec<&TariffRate> = self.rates.values().collect();
        rates.sort_by(|a, b| {
            (&a.hs6, &a.origin_slug, &a.dest_slug).cmp(&(&b.hs6, &b.origin_slug, &b.dest_slug))
        });
        rates
    }
}

impl TariffRepository for InMemoryTariffRepository {
    fn tariff_rate(&self, hs6: &str, origin_slug: &str, dest_slug: &str) -> Option<&TariffRate> {
        self.rates
            .get(&(hs6.to_string(), origin_slug.to_string(), dest_slug.to_string()))
    }

    fn tariff_version(&self) -> &TariffVersion {
        &self.version
    }
}

fn validate_rate(index: usize, rate: &TariffRate) -> LandedCostResult<()> {
    let in_unit_range = |r: Rate| r >= Decimal::ZERO && r <= Decimal::ONE;

    if !in_unit_range(rate.duty_rate) {
        return Err(LandedCostError::InvalidInput {
            field: format!("rates[{}].duty_rate", index),
            reason: "Duty rate must be between 0 and 1".into(),
        });
    }
    if !in_unit_range(rate.vat_rate) {
        return Err(LandedCostError::InvalidInput {
            field: format!("rates[{}].vat_rate", index),
            reason: "VAT rate must be between 0 and 1".into(),
        });
    }
    for (name, levy) in &rate.levies {
        if !in_unit_range(*levy) {
            return Err(LandedCostError::InvalidInput {
                field: format!("rates[{}].levies.{}", index, name),
                reason: "Levy rate must be between 0 and 1".into(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
