//! Premium calculation
//!
//! Pure decimal arithmetic with no internal rounding:
//!
//! ```text
//! international_in_domestic = international * rate
//! premium_percent           = (domestic / international_in_domestic - 1) * 100
//! price_difference          = domestic - international_in_domestic
//! ```

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::PremiumBreakdown;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Compare a domestic price against an international price converted at `rate`.
///
/// Returns `None` when `international` or `rate` is not positive, or when the
/// arithmetic overflows.
pub fn compute(domestic: Decimal, international: Decimal, rate: Decimal) -> Option<PremiumBreakdown> {
    if international <= Decimal::ZERO || rate <= Decimal::ZERO {
        return None;
    }

    let international_price_in_domestic = international.checked_mul(rate)?;
    let premium_percent = ratio_premium(domestic, international_price_in_domestic)?;
    let price_difference = domestic.checked_sub(international_price_in_domestic)?;

    Some(PremiumBreakdown {
        international_price_in_domestic,
        premium_percent,
        price_difference,
    })
}

/// How far the conversion rate sits above the fiat benchmark, in percent
pub fn rate_spread(conversion_rate: Decimal, fiat_rate: Decimal) -> Option<Decimal> {
    if conversion_rate <= Decimal::ZERO || fiat_rate <= Decimal::ZERO {
        return None;
    }
    ratio_premium(conversion_rate, fiat_rate)
}

/// Presentation rounding, half away from zero
pub fn round_for_display(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn ratio_premium(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator
        .checked_div(denominator)?
        .checked_sub(Decimal::ONE)?
        .checked_mul(HUNDRED)
}
