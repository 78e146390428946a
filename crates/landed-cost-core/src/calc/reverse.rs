//! Maximum affordable purchase price for a target gross margin.
//!
//! Bisection over the per-unit price in `[0, target selling price]`, running
//! the forward waterfall at each midpoint. The search assumes margin falls as
//! purchase price rises; a coarse probe checks that assumption and falls back
//! to a linear scan when it does not hold (for example when a product module
//! adds charges that shrink with invoice value).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::engine::{calculate_landed_cost, CalcContext};
use super::input::CalcInput;
use crate::types::{round_money, Money};

pub const REVERSE_ITERATIONS: u32 = 20;
pub const MONOTONICITY_PROBES: u32 = 9;
pub const LINEAR_SCAN_STEPS: u32 = 200;

/// Detailed result of the reverse calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPriceOutput {
    /// Highest per-unit purchase price meeting the target, rounded to cents.
    pub max_price_per_unit_zar: Money,
    pub target_selling_price_zar: Money,
    pub target_margin_percent: Decimal,
    /// Margin produced by the forward calculation at the returned price.
    pub achieved_margin_percent: Option<Decimal>,
    pub landed_cost_per_unit_zar: Option<Money>,
    pub iterations: u32,
    /// Whether any tested price met the target.
    pub target_met: bool,
    /// Whether the probe found margin non-increasing in price.
    pub monotonic: bool,
    pub used_linear_scan: bool,
    pub warnings: Vec<String>,
}

/// Max per-unit purchase price achieving `target_margin_percent` when
/// selling at `target_selling_price_zar`. Zero when no price qualifies.
pub fn calculate_max_purchase_price(
    ctx: &CalcContext<'_>,
    target_selling_price_zar: Money,
    target_margin_percent: Decimal,
    base: &CalcInput,
) -> Money {
    analyze_max_purchase_price(ctx, target_selling_price_zar, target_margin_percent, base)
        .max_price_per_unit_zar
}

pub fn analyze_max_purchase_price(
    ctx: &CalcContext<'_>,
    target_selling_price_zar: Money,
    target_margin_percent: Decimal,
    base: &CalcInput,
) -> MaxPriceOutput {
    let mut warnings: Vec<String> = Vec::new();
    let upper = target_selling_price_zar.max(Decimal::ZERO);
    let margin = |price: Decimal| margin_at(ctx, base, target_selling_price_zar, price);

    // --- Bisection ---
    let mut low = Decimal::ZERO;
    let mut high = upper;
    let mut best: Option<Decimal> = None;

    for i in 0..REVERSE_ITERATIONS {
        let mid = (low + high) / Decimal::TWO;
        let Some(m) = margin(mid) else {
            trace!(iteration = i, %mid, "no result at midpoint");
            continue;
        };
        trace!(iteration = i, %mid, margin = %m, "reverse search step");
        if m >= target_margin_percent {
            best = Some(mid);
            low = mid;
        } else {
            high = mid;
        }
    }

    // --- Monotonicity probe ---
    let probes: Vec<Decimal> = (0..MONOTONICITY_PROBES)
        .filter_map(|k| {
            let price = upper * Decimal::from(k) / Decimal::from(MONOTONICITY_PROBES - 1);
            margin(price)
        })
        .collect();
    let monotonic = probes.windows(2).all(|w| w[1] <= w[0]);

    let mut used_linear_scan = false;
    if !monotonic {
        warn!(
            hs6 = %base.hs6,
            "margin not monotonic in purchase price, cross-checking with linear scan"
        );
        warnings.push(
            "Margin is not monotonic in purchase price; result cross-checked with a linear scan."
                .to_string(),
        );
        let scanned = (0..=LINEAR_SCAN_STEPS)
            .map(|k| upper * Decimal::from(k) / Decimal::from(LINEAR_SCAN_STEPS))
            .filter(|price| matches!(margin(*price), Some(m) if m >= target_margin_percent))
            .max();
        if let Some(candidate) = scanned {
            if best.map_or(true, |b| candidate > b) {
                best = Some(candidate);
                used_linear_scan = true;
            }
        }
    }

    let target_met = best.is_some();
    if !target_met {
        warnings.push(format!(
            "No purchase price between 0 and {} per unit reaches a {}% gross margin.",
            round_money(upper),
            target_margin_percent.normalize()
        ));
    }

    let max_price = round_money(best.unwrap_or(Decimal::ZERO));
    let at_max = calculate_landed_cost(ctx, &priced_input(base, target_selling_price_zar, max_price));

    MaxPriceOutput {
        max_price_per_unit_zar: max_price,
        target_selling_price_zar,
        target_margin_percent,
        achieved_margin_percent: at_max.as_ref().map(|o| o.gross_margin_percent),
        landed_cost_per_unit_zar: at_max.as_ref().map(|o| o.landed_cost_per_unit_zar),
        iterations: REVERSE_ITERATIONS,
        target_met,
        monotonic,
        used_linear_scan,
        warnings,
    }
}

fn priced_input(base: &CalcInput, selling_price: Money, price_per_unit: Money) -> CalcInput {
    CalcInput {
        invoice_value_zar: price_per_unit * base.effective_quantity(),
        selling_price_per_unit_zar: selling_price,
        ..base.clone()
    }
}

fn margin_at(
    ctx: &CalcContext<'_>,
    base: &CalcInput,
    selling_price: Money,
    price_per_unit: Money,
) -> Option<Decimal> {
    calculate_landed_cost(ctx, &priced_input(base, selling_price, price_per_unit))
        .map(|out| out.gross_margin_percent)
}
