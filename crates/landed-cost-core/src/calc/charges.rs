//! Ancillary logistics charges: clearing agent, port/terminal and demurrage.
//!
//! Rand amounts reflect 2026 South African market averages per consignment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{round_money, Money, PortOfEntry, Rate, ShippingMode};

pub const AGENCY_BASE_FEE_ZAR: Money = dec!(2250);
pub const AGENCY_DISBURSEMENT_THRESHOLD_ZAR: Money = dec!(50000);
pub const AGENCY_DISBURSEMENT_RATE: Rate = dec!(0.005);

/// Durban congestion / terminal differential.
pub const CONGESTED_PORT: PortOfEntry = PortOfEntry::DBN;
pub const CONGESTION_SURCHARGE_RATE: Rate = dec!(0.10);

pub const DEMURRAGE_FREE_DAYS: u32 = 3;

pub fn port_base_charge(mode: ShippingMode) -> Money {
    match mode {
        ShippingMode::Air => dec!(850),
        ShippingMode::Lcl => dec!(2500),
        ShippingMode::Fcl20 => dec!(4500),
        ShippingMode::Fcl40 => dec!(6500),
    }
}

/// Daily demurrage once the free allowance is used up.
pub fn demurrage_daily_rate(mode: ShippingMode) -> Money {
    match mode {
        ShippingMode::Air => dec!(500),
        ShippingMode::Lcl => dec!(950),
        ShippingMode::Fcl20 => dec!(2200),
        ShippingMode::Fcl40 => dec!(4100),
    }
}

pub fn port_surcharge_rate(port: PortOfEntry) -> Rate {
    if port == CONGESTED_PORT {
        CONGESTION_SURCHARGE_RATE
    } else {
        Decimal::ZERO
    }
}

/// Port and terminal handling for one consignment, rounded to cents.
pub fn estimate_port_charges(mode: ShippingMode, port: PortOfEntry) -> Money {
    round_money(port_base_charge(mode) * (Decimal::ONE + port_surcharge_rate(port)))
}

/// Clearing agent fee: flat base plus a disbursement percentage on the part
/// of customs value above the threshold. Rounded to cents.
pub fn estimate_agency_fee(customs_value: Money) -> Money {
    let excess = (customs_value - AGENCY_DISBURSEMENT_THRESHOLD_ZAR).max(Decimal::ZERO);
    round_money(AGENCY_BASE_FEE_ZAR + excess * AGENCY_DISBURSEMENT_RATE)
}

/// Days billed beyond the free allowance.
pub fn excess_demurrage_days(days: u32) -> u32 {
    days.saturating_sub(DEMURRAGE_FREE_DAYS)
}

pub fn demurrage_charge(days: u32, mode: ShippingMode) -> Money {
    Decimal::from(excess_demurrage_days(days)) * demurrage_daily_rate(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agency_fee_known_answer() {
        // 2250 + 0.5% x (100000 - 50000) = 2500
        assert_eq!(estimate_agency_fee(dec!(100000)), dec!(2500));
    }

    #[test]
    fn test_agency_fee_below_threshold_is_base() {
        assert_eq!(estimate_agency_fee(dec!(12000)), dec!(2250));
        assert_eq!(estimate_agency_fee(dec!(50000)), dec!(2250));
    }

    #[test]
    fn test_durban_surcharge() {
        // 2500 x 1.1
        assert_eq!(
            estimate_port_charges(ShippingMode::Lcl, PortOfEntry::DBN),
            dec!(2750)
        );
        assert_eq!(
            estimate_port_charges(ShippingMode::Lcl, PortOfEntry::CPT),
            dec!(2500)
        );
        assert_eq!(
            estimate_port_charges(ShippingMode::Air, PortOfEntry::DBN),
            dec!(935)
        );
    }

    #[test]
    fn test_demurrage_free_allowance() {
        for days in 0..=3 {
            assert_eq!(demurrage_charge(days, ShippingMode::Fcl40), Decimal::ZERO);
        }
    }

    #[test]
    fn test_demurrage_linear_above_allowance() {
        assert_eq!(demurrage_charge(4, ShippingMode::Lcl), dec!(950));
        assert_eq!(demurrage_charge(10, ShippingMode::Fcl20), dec!(15400));
        assert_eq!(demurrage_charge(8, ShippingMode::Air), dec!(2500));
    }
}
