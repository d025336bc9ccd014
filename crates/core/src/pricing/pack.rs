//! Pack price composition.
//!
//! A pack's calculated total is the sum of its components' daily prices, any
//! flat extra, and half of the components' shipping and installation costs
//! (only for the services the pack includes). The discount is then applied,
//! and an admin-set custom price overrides the result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PricingError;
use crate::types::{percent_of, round_money};

/// Component product as seen by the pack pricing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackComponent {
    /// Units of this product in one pack.
    pub quantity: i32,
    /// Product daily price.
    pub price_per_day: Decimal,
    /// Product shipping cost per unit.
    pub shipping_cost: Decimal,
    /// Product installation cost per unit.
    pub installation_cost: Decimal,
}

/// Pack fields the pricing rule reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackPricingInput {
    pub components: Vec<PackComponent>,
    /// Flat amount added on top of the components.
    #[serde(default)]
    pub price_extra: Decimal,
    #[serde(default)]
    pub include_shipping: bool,
    #[serde(default)]
    pub include_installation: bool,
    /// Discount percentage (0-100). Derived from the amount when zero.
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// Discount in euros. Derived from the percentage when zero.
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub custom_price_enabled: bool,
    /// Stored final price; only read when `custom_price_enabled`.
    #[serde(default)]
    pub final_price: Decimal,
}

/// Computed pack price breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackPricing {
    pub base_price_per_day: Decimal,
    pub base_shipping_cost: Decimal,
    pub base_installation_cost: Decimal,
    pub price_extra: Decimal,
    /// Sum of the four amounts above.
    pub calculated_total_price: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    /// `calculated_total_price - discount_amount`, floored at zero.
    pub price_after_discount: Decimal,
    pub final_price: Decimal,
    /// True when the stored custom price was used.
    pub custom_price_enabled: bool,
    pub savings_amount: Decimal,
    pub savings_percentage: Decimal,
}

/// Compute a pack's price.
///
/// # Errors
///
/// Returns `PricingError::InvalidQuantity` when a component quantity is below 1.
pub fn calculate_pack_price(input: &PackPricingInput) -> Result<PackPricing, PricingError> {
    if let Some(bad) = input.components.iter().find(|c| c.quantity < 1) {
        return Err(PricingError::InvalidQuantity(bad.quantity));
    }

    let half = Decimal::TWO;
    let mut base_price_per_day = Decimal::ZERO;
    let mut shipping = Decimal::ZERO;
    let mut installation = Decimal::ZERO;
    for c in &input.components {
        let qty = Decimal::from(c.quantity);
        base_price_per_day += c.price_per_day * qty;
        shipping += c.shipping_cost * qty;
        installation += c.installation_cost * qty;
    }

    // Stored breakdown fields are cents; compose from the rounded parts so a
    // recomputation from stored values lands on the same price.
    let base_price_per_day = round_money(base_price_per_day);
    let base_shipping_cost = if input.include_shipping {
        round_money(shipping / half)
    } else {
        Decimal::ZERO
    };
    let base_installation_cost = if input.include_installation {
        round_money(installation / half)
    } else {
        Decimal::ZERO
    };
    let price_extra = round_money(input.price_extra);

    let calculated = base_price_per_day + price_extra + base_shipping_cost + base_installation_cost;

    let (discount_percentage, discount_amount) =
        resolve_discount(calculated, input.discount_percentage, input.discount_amount);

    let price_after_discount = (calculated - discount_amount).max(Decimal::ZERO);

    let custom = input.custom_price_enabled && input.final_price > Decimal::ZERO;
    let final_price = if custom {
        round_money(input.final_price)
    } else {
        price_after_discount
    };

    let savings_amount = (calculated - final_price).max(Decimal::ZERO);
    let savings_percentage = if calculated > Decimal::ZERO {
        savings_amount / calculated * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    Ok(PackPricing {
        base_price_per_day,
        base_shipping_cost,
        base_installation_cost,
        price_extra,
        calculated_total_price: calculated,
        discount_percentage,
        discount_amount,
        price_after_discount,
        final_price,
        custom_price_enabled: custom,
        savings_amount,
        savings_percentage: round_money(savings_percentage),
    })
}

/// Fill in whichever of percentage/amount is missing, both rounded to cents.
/// When both are set the euro amount is applied as given. A percentage
/// derived from an amount larger than the total is capped at 100.
fn resolve_discount(total: Decimal, percentage: Decimal, amount: Decimal) -> (Decimal, Decimal) {
    let derive_percentage = amount > Decimal::ZERO && percentage.is_zero() && total > Decimal::ZERO;
    let (percentage, amount) = if derive_percentage {
        let derived = (amount / total * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED);
        (derived, amount)
    } else if percentage > Decimal::ZERO && amount.is_zero() {
        (percentage, percent_of(total, percentage))
    } else {
        (percentage, amount)
    };
    (round_money(percentage), round_money(amount))
}
