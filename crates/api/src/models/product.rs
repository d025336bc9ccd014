//! Rental catalogue products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resona_core::pricing::RentalRates;
use resona_core::stock::{StockLevels, StockOperation};
use resona_core::{CategoryId, ProductId, ProductStatus, StockStatus};

/// A rentable product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_per_day: Decimal,
    pub price_per_weekend: Decimal,
    pub price_per_week: Decimal,
    /// Per-unit deposit overriding the percentage rule when positive.
    pub custom_deposit: Option<Decimal>,
    pub shipping_cost: Decimal,
    pub installation_cost: Decimal,
    /// Catalogue stock.
    pub stock: i32,
    /// Units physically owned; `None` on rows not yet backfilled.
    pub real_stock: Option<i32>,
    /// Units not tied up by open orders.
    pub available_stock: i32,
    pub stock_status: StockStatus,
    /// Notice needed for `ON_DEMAND` products.
    pub lead_time_days: i32,
    pub status: ProductStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn rates(&self) -> RentalRates {
        RentalRates {
            price_per_day: self.price_per_day,
            price_per_weekend: self.price_per_weekend,
            price_per_week: self.price_per_week,
        }
    }

    #[must_use]
    pub const fn stock_levels(&self) -> StockLevels {
        StockLevels {
            stock: self.stock,
            real_stock: self.real_stock,
            available_stock: self.available_stock,
            status: self.status,
        }
    }
}

/// Body of `PATCH /products/{id}/stock`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockUpdateInput {
    pub operation: StockOperation,
    pub quantity: i32,
}
