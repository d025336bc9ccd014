//! Packs: bundles of products sold as one priced unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resona_core::pricing::{PackComponent, PackPricingInput};
use resona_core::{CategoryId, PackCategory, PackId, ProductId};

/// A pack and its stored pricing fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pack {
    pub id: PackId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: PackCategory,
    pub category_ref: Option<CategoryId>,
    pub price_extra: Decimal,
    pub include_shipping: bool,
    pub include_installation: bool,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub custom_price_enabled: bool,
    /// Recompute stored prices when components change.
    pub auto_calculate: bool,
    pub base_price_per_day: Decimal,
    pub base_shipping_cost: Decimal,
    pub base_installation_cost: Decimal,
    pub calculated_total_price: Decimal,
    pub final_price: Decimal,
    pub savings_amount: Decimal,
    pub savings_percentage: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A pack component joined with the product fields pricing needs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PackItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price_per_day: Decimal,
    pub shipping_cost: Decimal,
    pub installation_cost: Decimal,
}

impl PackItem {
    #[must_use]
    pub const fn component(&self) -> PackComponent {
        PackComponent {
            quantity: self.quantity,
            price_per_day: self.price_per_day,
            shipping_cost: self.shipping_cost,
            installation_cost: self.installation_cost,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackWithItems {
    #[serde(flatten)]
    pub pack: Pack,
    pub items: Vec<PackItem>,
}

impl Pack {
    /// Inputs for the pack pricing rule.
    #[must_use]
    pub fn pricing_input(&self, items: &[PackItem]) -> PackPricingInput {
        PackPricingInput {
            components: items.iter().map(PackItem::component).collect(),
            price_extra: self.price_extra,
            include_shipping: self.include_shipping,
            include_installation: self.include_installation,
            discount_percentage: self.discount_percentage,
            discount_amount: self.discount_amount,
            custom_price_enabled: self.custom_price_enabled,
            final_price: self.final_price,
        }
    }
}
