//! Product queries, stock counters and date-range reservations.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use resona_core::order::holds_reservation;
use resona_core::stock::{Reservation, StockLevels};
use resona_core::{OrderStatus, ProductId};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str = r"
    p.id, p.category_id, p.name, p.slug, p.sku, p.description,
    p.price_per_day, p.price_per_weekend, p.price_per_week, p.custom_deposit,
    p.shipping_cost, p.installation_cost,
    p.stock, p.real_stock, p.available_stock, p.stock_status, p.lead_time_days,
    p.status, p.is_active, p.created_at, p.updated_at
";

/// An order line overlapping a date range, with its order's status.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    product_id: ProductId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    quantity: i32,
    status: OrderStatus,
}

impl ReservationRow {
    const fn reservation(&self) -> Reservation {
        Reservation {
            start: self.start_date,
            end: self.end_date,
            quantity: self.quantity,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, optionally restricted to one category slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_active AND ($1::text IS NULL OR c.slug = $1)
            ORDER BY p.name
            "
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_slug)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Every product, active or not. Used by the integrity checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.id");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Lock products for the rest of the transaction, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1) ORDER BY p.id FOR UPDATE"
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(raw)
            .fetch_all(conn)
            .await?)
    }

    /// Write all stock counters of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock_levels(
        conn: &mut PgConnection,
        id: ProductId,
        levels: &StockLevels,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = $2, real_stock = $3, available_stock = $4, status = $5, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(levels.stock)
        .bind(levels.real_stock)
        .bind(levels.available_stock)
        .bind(levels.status)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Reservations of `product_id` overlapping `[start, end]` held by open orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reservations(
        &self,
        product_id: ProductId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = self
            .reservation_rows(&[product_id.as_i32()], start, end)
            .await?;
        Ok(rows
            .iter()
            .filter(|r| holds_reservation(r.status))
            .map(ReservationRow::reservation)
            .collect())
    }

    /// Open reservations of several products, grouped per product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reservations_for(
        &self,
        product_ids: &[ProductId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(ProductId, Vec<Reservation>)>, RepositoryError> {
        let raw: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();
        let rows = self.reservation_rows(&raw, start, end).await?;

        Ok(product_ids
            .iter()
            .map(|id| {
                let held = rows
                    .iter()
                    .filter(|r| r.product_id == *id && holds_reservation(r.status))
                    .map(ReservationRow::reservation)
                    .collect();
                (*id, held)
            })
            .collect())
    }

    async fn reservation_rows(
        &self,
        product_ids: &[i32],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ReservationRow>, RepositoryError> {
        Ok(sqlx::query_as::<_, ReservationRow>(
            r"
            SELECT oi.product_id, oi.start_date, oi.end_date, oi.quantity, o.status
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE oi.product_id = ANY($1)
              AND oi.start_date <= $3
              AND oi.end_date >= $2
            ",
        )
        .bind(product_ids)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?)
    }
}
