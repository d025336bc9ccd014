//! Order totals: VIP discount and IVA.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{UserLevel, percent_of, round_money};

/// Spanish IVA applied to the discounted subtotal plus delivery.
pub const TAX_RATE_PERCENT: Decimal = Decimal::from_parts(21, 0, 0, false, 0);

/// Rental discount granted to each customer tier.
#[must_use]
pub const fn vip_discount_percent(level: UserLevel) -> Decimal {
    match level {
        UserLevel::Standard => Decimal::ZERO,
        UserLevel::Vip => Decimal::from_parts(50, 0, 0, false, 0),
        UserLevel::VipPlus => Decimal::from_parts(70, 0, 0, false, 0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Σ line totals.
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount: Decimal,
    pub delivery_cost: Decimal,
    /// `subtotal - discount + delivery_cost`.
    pub taxable_base: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Totals for an order. The VIP discount applies to rentals only, never to
/// delivery.
#[must_use]
pub fn order_totals(level: UserLevel, subtotal: Decimal, delivery_cost: Decimal) -> OrderTotals {
    let subtotal = round_money(subtotal);
    let delivery_cost = round_money(delivery_cost);
    let discount_percent = vip_discount_percent(level);
    let discount = round_money(percent_of(subtotal, discount_percent));
    let taxable_base = subtotal - discount + delivery_cost;
    let tax = round_money(percent_of(taxable_base, TAX_RATE_PERCENT));

    OrderTotals {
        subtotal,
        discount_percent,
        discount,
        delivery_cost,
        taxable_base,
        tax,
        total: taxable_base + tax,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn standard_pays_full_price_plus_tax() {
        let t = order_totals(UserLevel::Standard, dec("200"), dec("30"));
        assert_eq!(t.discount, Decimal::ZERO);
        assert_eq!(t.taxable_base, dec("230"));
        assert_eq!(t.tax, dec("48.30"));
        assert_eq!(t.total, dec("278.30"));
    }

    #[test]
    fn vip_discount_excludes_delivery() {
        let t = order_totals(UserLevel::Vip, dec("200"), dec("30"));
        assert_eq!(t.discount, dec("100"));
        assert_eq!(t.taxable_base, dec("130"));
        assert_eq!(t.tax, dec("27.30"));
        assert_eq!(t.total, dec("157.30"));

        let t = order_totals(UserLevel::VipPlus, dec("200"), Decimal::ZERO);
        assert_eq!(t.discount, dec("140"));
        assert_eq!(t.total, dec("72.60"));
    }

    #[test]
    fn tax_is_rounded_to_cents() {
        let t = order_totals(UserLevel::Standard, dec("10.05"), Decimal::ZERO);
        // 10.05 × 0.21 = 2.1105
        assert_eq!(t.tax, dec("2.11"));
        assert_eq!(t.total, dec("12.16"));
    }
}
