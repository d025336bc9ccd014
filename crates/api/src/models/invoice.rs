use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resona_core::{InvoiceId, OrderId};

/// Invoice issued for an order. At most one per order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: InvoiceId,
    /// `INV-YYYY-NNNNN`
    pub invoice_number: String,
    pub order_id: OrderId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Taxable base (rentals after discount, plus delivery).
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}
