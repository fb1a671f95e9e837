//! Betfair price ladder
//!
//! Minimum price increments for each band of the exchange ladder, plus the
//! two-decimal rounding used throughout the analysis.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Minimum price increment at `price`.
///
/// Bands are selected by the integer floor of the price, so every band is
/// inclusive of its lower bound: `4.00` ticks in `0.1`, `3.99` in `0.05`.
pub fn tick_offset(price: Decimal) -> Decimal {
    let band = price.trunc().to_i64().unwrap_or(i64::MAX);

    match band {
        i64::MIN..=1 => dec!(0.01),
        2 => dec!(0.02),
        3 => dec!(0.05),
        4..=5 => dec!(0.1),
        6..=9 => dec!(0.2),
        10..=19 => dec!(0.5),
        20..=29 => dec!(1),
        30..=49 => dec!(2),
        _ => dec!(10),
    }
}

/// Round to two decimal places, midpoints away from zero
pub fn round_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
