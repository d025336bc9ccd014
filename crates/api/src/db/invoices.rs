use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use resona_core::order::DocumentKind;
use resona_core::{InvoiceId, OrderId};

use super::{RepositoryError, latest_sequence, lock_numbering};
use crate::models::Invoice;

const INVOICE_COLUMNS: &str = r"
    id, invoice_number, order_id, issue_date, due_date, subtotal, tax_amount, total, created_at
";

/// Amounts and dates of a new invoice.
#[derive(Debug, Clone, Copy)]
pub struct NewInvoice {
    pub order_id: OrderId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Repository for invoice database operations.
pub struct InvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// The invoice already issued for an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_order(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE order_id = $1");
        Ok(sqlx::query_as::<_, Invoice>(&sql)
            .bind(order_id)
            .fetch_optional(conn)
            .await?)
    }

    /// Insert an invoice under the next `INV-YYYY-NNNNN` number of its
    /// issue year.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order already has an invoice.
    pub async fn insert(
        conn: &mut PgConnection,
        year: i32,
        invoice: &NewInvoice,
    ) -> Result<Invoice, RepositoryError> {
        let kind = DocumentKind::Invoice;
        lock_numbering(conn, kind.prefix()).await?;
        let latest =
            latest_sequence(&mut *conn, "invoices", "invoice_number", kind, year).await?;
        let number = kind.next_after(year, latest);

        let sql = format!(
            r"
            INSERT INTO invoices (
                invoice_number, order_id, issue_date, due_date, subtotal, tax_amount, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INVOICE_COLUMNS}
            "
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(&number)
            .bind(invoice.order_id)
            .bind(invoice.issue_date)
            .bind(invoice.due_date)
            .bind(invoice.subtotal)
            .bind(invoice.tax_amount)
            .bind(invoice.total)
            .fetch_one(conn)
            .await
            .map_err(|e| RepositoryError::from_write(e, "invoice"))
    }
}
