//! Pricing rules.
//!
//! - [`coupon`] - Discount coupons with scope, limits and caps
//! - [`deposit`] - Refundable deposit per order, waived for VIP tiers
//! - [`shipping`] - Distance-banded shipping and installation quotes
//! - [`pack`] - Pack price composition from component products
//! - [`rental`] - Unit price for a rental period (day/weekend/week tiers)
//! - [`totals`] - VIP discount, IVA and order totals

pub mod coupon;
pub mod deposit;
pub mod pack;
pub mod rental;
pub mod shipping;
pub mod totals;

use thiserror::Error;

pub use coupon::{Coupon, CouponDiscount, CouponError, CouponScope, DiscountType, Redemption};
pub use deposit::{DEPOSIT_RATE_PERCENT, DepositLine, DepositQuote, calculate_deposit};
pub use pack::{PackComponent, PackPricing, PackPricingInput, calculate_pack_price};
pub use rental::{RentalRates, line_total, rental_days, unit_price};
pub use shipping::{
    MAX_DISTANCE_KM, ShippingConfig, ShippingCostLine, ShippingQuote, ShippingRequest,
    check_distance, quote_shipping,
};
pub use totals::{OrderTotals, TAX_RATE_PERCENT, order_totals, vip_discount_percent};

/// Errors raised by pricing rules on invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Distance is negative or larger than an order can store.
    #[error("distance must be between 0 and 999999.99 km (got {0} km)")]
    InvalidDistance(rust_decimal::Decimal),

    /// An intermediate amount does not fit a decimal.
    #[error("amount is too large")]
    AmountOverflow,

    /// Rental end date precedes the start date.
    #[error("end date {end} is before start date {start}")]
    InvalidDates {
        /// Rental start.
        start: chrono::NaiveDate,
        /// Rental end.
        end: chrono::NaiveDate,
    },

    /// Quantity must be at least one.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i32),

    /// Shipping configuration would produce non-monotonic prices.
    #[error("invalid shipping configuration: {0}")]
    InvalidConfig(String),
}
