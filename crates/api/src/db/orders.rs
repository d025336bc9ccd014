//! Order and order item persistence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use resona_core::alerts::Demand;
use resona_core::order::{DocumentKind, holds_reservation};
use resona_core::pricing::DepositLine;
use resona_core::{
    DeliveryType, DepositStatus, OrderId, OrderStatus, PaymentStatus, ProductId, UserId, UserLevel,
};

use super::{RepositoryError, latest_sequence, lock_numbering};
use crate::models::{Order, OrderItem, Pagination};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, status, payment_status, start_date, end_date,
    delivery_type, delivery_address, distance_km, subtotal, discount_amount,
    shipping_cost, tax_amount, total, deposit_amount, deposit_status, advance_paid,
    notes, created_at, updated_at
";

const ITEM_SELECT: &str = r"
    SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, oi.quantity,
           oi.start_date, oi.end_date, oi.price_per_unit, oi.total_price, oi.stock_reserved
    FROM order_items oi
    LEFT JOIN products p ON p.id = oi.product_id
";

/// Values of a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
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
    pub notes: Option<String>,
}

/// Values of a new order line.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    pub stock_reserved: bool,
}

/// An order's stored deposit next to its customer's tier.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDepositRow {
    pub order_id: OrderId,
    pub order_number: String,
    pub user_level: UserLevel,
    pub deposit_amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct DepositItemRow {
    quantity: i32,
    total_price: Decimal,
    product_id: Option<ProductId>,
    custom_deposit: Option<Decimal>,
}

impl From<DepositItemRow> for DepositLine {
    fn from(row: DepositItemRow) -> Self {
        if row.product_id.is_some() {
            Self::new(row.quantity, row.total_price, row.custom_deposit)
        } else {
            Self::orphan(row.quantity, row.total_price)
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DemandRow {
    product_id: ProductId,
    order_number: String,
    start_date: NaiveDate,
    quantity: i32,
    status: OrderStatus,
}

impl From<DemandRow> for Demand {
    fn from(row: DemandRow) -> Self {
        Self {
            product_id: row.product_id,
            order_number: row.order_number,
            start_date: row.start_date,
            quantity: row.quantity,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Lines of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Self::items_in(&mut *self.pool.acquire().await?, order_id).await
    }

    /// Lines of an order, read on an existing connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_in(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!("{ITEM_SELECT} WHERE oi.order_id = $1 ORDER BY oi.id");
        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(conn)
            .await?)
    }

    /// A page of a customer's orders, newest first, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((orders, total))
    }

    /// Lock an order row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Insert an order under the next `RES-YYYY-NNNN` number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the number is already taken.
    pub async fn insert(
        conn: &mut PgConnection,
        year: i32,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let kind = DocumentKind::Order;
        lock_numbering(conn, kind.prefix()).await?;
        let latest = latest_sequence(&mut *conn, "orders", "order_number", kind, year).await?;
        let number = kind.next_after(year, latest);

        let sql = format!(
            r"
            INSERT INTO orders (
                order_number, user_id, start_date, end_date, delivery_type,
                delivery_address, distance_km, subtotal, discount_amount, shipping_cost,
                tax_amount, total, deposit_amount, deposit_status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ORDER_COLUMNS}
            "
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(&number)
            .bind(order.user_id)
            .bind(order.start_date)
            .bind(order.end_date)
            .bind(order.delivery_type)
            .bind(order.delivery_address.as_deref())
            .bind(order.distance_km)
            .bind(order.subtotal)
            .bind(order.discount_amount)
            .bind(order.shipping_cost)
            .bind(order.tax_amount)
            .bind(order.total)
            .bind(order.deposit_amount)
            .bind(order.deposit_status)
            .bind(order.notes.as_deref())
            .fetch_one(conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "order number"))
    }

    /// Insert one order line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO order_items (
                order_id, product_id, quantity, start_date, end_date,
                price_per_unit, total_price, stock_reserved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.start_date)
        .bind(item.end_date)
        .bind(item.price_per_unit)
        .bind(item.total_price)
        .bind(item.stock_reserved)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Change an order's status and optionally append a line to its notes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
        payment_status: PaymentStatus,
        note: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders SET
                status = $2,
                payment_status = $3,
                notes = CASE
                    WHEN $4::text IS NULL THEN notes
                    WHEN notes IS NULL OR notes = '' THEN $4
                    ELSE notes || E'\n' || $4
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .bind(payment_status)
            .bind(note)
            .fetch_optional(conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Clear the reservation flag on an order's lines once stock is released.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn clear_reservations(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE order_items SET stock_reserved = FALSE WHERE order_id = $1")
            .bind(order_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Stored deposits joined with each customer's tier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deposits(&self) -> Result<Vec<OrderDepositRow>, RepositoryError> {
        Ok(sqlx::query_as::<_, OrderDepositRow>(
            r"
            SELECT o.id AS order_id, o.order_number, u.user_level, o.deposit_amount
            FROM orders o
            JOIN users u ON u.id = o.user_id
            ORDER BY o.id
            ",
        )
        .fetch_all(self.pool)
        .await?)
    }

    /// Units still needed by orders that hold stock, for items ending on or
    /// after `today`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn open_demand(&self, today: NaiveDate) -> Result<Vec<Demand>, RepositoryError> {
        let rows = sqlx::query_as::<_, DemandRow>(
            r"
            SELECT oi.product_id, o.order_number, oi.start_date, oi.quantity, o.status
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE oi.product_id IS NOT NULL
              AND oi.end_date >= $1
            ORDER BY oi.start_date, o.order_number
            ",
        )
        .bind(today)
        .fetch_all(self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter(|r| holds_reservation(r.status))
            .map(Demand::from)
            .collect())
    }

    /// Lines of an order in the shape the deposit rule reads.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deposit_lines(&self, order_id: OrderId) -> Result<Vec<DepositLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, DepositItemRow>(
            r"
            SELECT oi.quantity, oi.total_price, p.id AS product_id, p.custom_deposit
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(DepositLine::from).collect())
    }

    /// Overwrite an order's deposit amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_deposit(&self, id: OrderId, amount: Decimal) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET deposit_amount = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(amount)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
