//! Discount coupons.
//!
//! A coupon takes a percentage off the order (optionally capped), a fixed
//! amount (never more than the order), or waives shipping. Its scope limits
//! it to one customer, or to carts holding a given product or category.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CategoryId, ProductId, UserId, percent_of, round_money};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon is inactive")]
    Inactive,

    #[error("coupon is valid from {0}")]
    NotYetValid(DateTime<Utc>),

    #[error("coupon expired on {0}")]
    Expired(DateTime<Utc>),

    #[error("order amount {amount} is below the coupon minimum of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("coupon has been used up")]
    Exhausted,

    #[error("coupon was already used by this customer")]
    AlreadyUsed,

    #[error("coupon is not valid for this customer")]
    NotForUser,

    #[error("coupon does not apply to any product in the cart")]
    NotForCart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    FreeShipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponScope {
    AllProducts,
    Category(CategoryId),
    Product(ProductId),
    User(UserId),
}

/// A coupon as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    /// Percent for `Percentage`, euros for `FixedAmount`, ignored otherwise.
    pub discount_value: Decimal,
    pub scope: CouponScope,
    pub minimum_amount: Option<Decimal>,
    /// Cap on a percentage discount.
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub usage_limit_per_user: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// The order a coupon is redeemed against.
#[derive(Debug, Clone, Copy)]
pub struct Redemption<'a> {
    pub user_id: UserId,
    pub order_amount: Decimal,
    pub product_ids: &'a [ProductId],
    pub category_ids: &'a [CategoryId],
    /// Times this customer already used the coupon.
    pub previous_uses: i32,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDiscount {
    pub discount_amount: Decimal,
    pub free_shipping: bool,
}

/// Normalise a typed-in code for lookup.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Check that the coupon can be used for `redemption`.
    ///
    /// # Errors
    ///
    /// Returns the first `CouponError` that applies, checking activity,
    /// validity window, minimum amount, usage limits, then scope.
    pub fn check(&self, redemption: &Redemption<'_>) -> Result<(), CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive);
        }
        if redemption.now < self.valid_from {
            return Err(CouponError::NotYetValid(self.valid_from));
        }
        if let Some(valid_to) = self.valid_to
            && redemption.now > valid_to
        {
            return Err(CouponError::Expired(valid_to));
        }
        if let Some(minimum) = self.minimum_amount
            && redemption.order_amount < minimum
        {
            return Err(CouponError::BelowMinimum {
                amount: redemption.order_amount,
                minimum,
            });
        }
        if self.usage_limit.is_some_and(|limit| self.usage_count >= limit) {
            return Err(CouponError::Exhausted);
        }
        if self
            .usage_limit_per_user
            .is_some_and(|limit| redemption.previous_uses >= limit)
        {
            return Err(CouponError::AlreadyUsed);
        }

        match self.scope {
            CouponScope::AllProducts => Ok(()),
            CouponScope::User(user_id) if user_id == redemption.user_id => Ok(()),
            CouponScope::User(_) => Err(CouponError::NotForUser),
            CouponScope::Category(id) if redemption.category_ids.contains(&id) => Ok(()),
            CouponScope::Product(id) if redemption.product_ids.contains(&id) => Ok(()),
            CouponScope::Category(_) | CouponScope::Product(_) => Err(CouponError::NotForCart),
        }
    }

    /// Validate the coupon and compute its discount on `order_amount`.
    ///
    /// The discount never exceeds the order amount.
    ///
    /// # Errors
    ///
    /// See [`Coupon::check`].
    pub fn apply(&self, redemption: &Redemption<'_>) -> Result<CouponDiscount, CouponError> {
        self.check(redemption)?;

        let amount = redemption.order_amount.max(Decimal::ZERO);
        let discount = match self.discount_type {
            DiscountType::Percentage => {
                let raw = percent_of(amount, self.discount_value);
                self.max_discount.map_or(raw, |cap| raw.min(cap))
            }
            DiscountType::FixedAmount => self.discount_value,
            DiscountType::FreeShipping => Decimal::ZERO,
        };

        Ok(CouponDiscount {
            discount_amount: round_money(discount.clamp(Decimal::ZERO, amount)),
            free_shipping: self.discount_type == DiscountType::FreeShipping,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn coupon(discount_type: DiscountType, value: &str) -> Coupon {
        Coupon {
            code: "VERANO25".to_owned(),
            discount_type,
            discount_value: dec(value),
            scope: CouponScope::AllProducts,
            minimum_amount: None,
            max_discount: None,
            usage_limit: None,
            usage_count: 0,
            usage_limit_per_user: None,
            valid_from: at(1),
            valid_to: Some(at(30)),
            is_active: true,
        }
    }

    fn redemption(amount: &str) -> Redemption<'static> {
        Redemption {
            user_id: UserId::new(1),
            order_amount: dec(amount),
            product_ids: &[],
            category_ids: &[],
            previous_uses: 0,
            now: at(15),
        }
    }

    #[test]
    fn percentage_is_capped_by_max_discount() {
        let mut c = coupon(DiscountType::Percentage, "20");
        assert_eq!(c.apply(&redemption("300")).unwrap().discount_amount, dec("60"));

        c.max_discount = Some(dec("45"));
        assert_eq!(c.apply(&redemption("300")).unwrap().discount_amount, dec("45"));
        assert_eq!(c.apply(&redemption("100")).unwrap().discount_amount, dec("20"));
    }

    #[test]
    fn percentage_rounds_to_cents() {
        let c = coupon(DiscountType::Percentage, "15");
        assert_eq!(c.apply(&redemption("33.33")).unwrap().discount_amount, dec("5.00"));
    }

    #[test]
    fn fixed_amount_never_exceeds_the_order() {
        let c = coupon(DiscountType::FixedAmount, "50");
        assert_eq!(c.apply(&redemption("120")).unwrap().discount_amount, dec("50"));
        assert_eq!(c.apply(&redemption("35.50")).unwrap().discount_amount, dec("35.50"));
    }

    #[test]
    fn free_shipping_discounts_nothing_else() {
        let d = coupon(DiscountType::FreeShipping, "0")
            .apply(&redemption("200"))
            .unwrap();
        assert!(d.free_shipping);
        assert_eq!(d.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn validity_window_and_activity() {
        let mut c = coupon(DiscountType::FixedAmount, "10");
        let mut r = redemption("100");

        r.now = Utc.with_ymd_and_hms(2025, 5, 31, 23, 0, 0).unwrap();
        assert_eq!(c.check(&r), Err(CouponError::NotYetValid(at(1))));
        r.now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(c.check(&r), Err(CouponError::Expired(at(30))));

        c.valid_to = None;
        assert!(c.check(&r).is_ok());
        c.is_active = false;
        assert_eq!(c.check(&r), Err(CouponError::Inactive));
    }

    #[test]
    fn minimum_amount_and_usage_limits() {
        let mut c = coupon(DiscountType::FixedAmount, "10");
        c.minimum_amount = Some(dec("150"));
        assert!(matches!(
            c.check(&redemption("149.99")),
            Err(CouponError::BelowMinimum { .. })
        ));
        assert!(c.check(&redemption("150")).is_ok());

        c.usage_limit = Some(3);
        c.usage_count = 3;
        assert_eq!(c.check(&redemption("200")), Err(CouponError::Exhausted));

        c.usage_count = 1;
        c.usage_limit_per_user = Some(1);
        let mut r = redemption("200");
        r.previous_uses = 1;
        assert_eq!(c.check(&r), Err(CouponError::AlreadyUsed));
    }

    #[test]
    fn scope_restricts_user_product_and_category() {
        let products = [ProductId::new(4), ProductId::new(9)];
        let categories = [CategoryId::new(2)];
        let r = Redemption {
            product_ids: &products,
            category_ids: &categories,
            ..redemption("100")
        };

        let mut c = coupon(DiscountType::Percentage, "10");
        c.scope = CouponScope::User(UserId::new(1));
        assert!(c.check(&r).is_ok());
        c.scope = CouponScope::User(UserId::new(2));
        assert_eq!(c.check(&r), Err(CouponError::NotForUser));

        c.scope = CouponScope::Product(ProductId::new(9));
        assert!(c.check(&r).is_ok());
        c.scope = CouponScope::Product(ProductId::new(5));
        assert_eq!(c.check(&r), Err(CouponError::NotForCart));

        c.scope = CouponScope::Category(CategoryId::new(2));
        assert!(c.check(&r).is_ok());
        c.scope = CouponScope::Category(CategoryId::new(3));
        assert_eq!(c.check(&r), Err(CouponError::NotForCart));
    }

    #[test]
    fn codes_are_matched_case_insensitively() {
        assert_eq!(normalize_code(" verano25 "), "VERANO25");
    }

    #[test]
    fn scope_serializes_with_its_target() {
        let json = serde_json::to_value(CouponScope::Product(ProductId::new(9))).unwrap();
        assert_eq!(json, serde_json::json!({ "scope": "PRODUCT", "target": 9 }));
        let all = serde_json::to_value(CouponScope::AllProducts).unwrap();
        assert_eq!(all, serde_json::json!({ "scope": "ALL_PRODUCTS" }));
    }
}
