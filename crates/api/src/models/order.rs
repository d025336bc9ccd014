//! Orders and order items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resona_core::{
    DeliveryType, DepositStatus, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId,
    UserId,
};

/// A rental order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// `RES-YYYY-NNNN`
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub distance_km: Option<Decimal>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub deposit_amount: Decimal,
    pub deposit_status: DepositStatus,
    /// Advance collected so far; the basis of cancellation refunds.
    pub advance_paid: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One rented product line.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    /// Whether `available_stock` was decremented for this line.
    pub stock_reserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    /// Required for `DELIVERY` orders.
    pub distance_km: Option<Decimal>,
    #[serde(default)]
    pub include_installation: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub night: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

/// Body of `POST /orders/{id}/cancel`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelOrderInput {
    /// When present, must match the order's owner.
    pub user_id: Option<UserId>,
    pub reason: Option<String>,
}
