//! Money helpers.
//!
//! All amounts are EUR held in [`Decimal`]. Rules round at their output
//! boundary with [`round_money`] so stored values never carry sub-cent noise.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent`% of `amount`, unrounded.
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}
