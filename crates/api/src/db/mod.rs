//! Database operations for the Resona `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Customers and staff, with their `user_level`
//! - `categories` - Product categories (Montaje is hidden)
//! - `products` - Rental catalogue with stock counters and rates
//! - `packs`, `pack_items` - Bundles and their component products
//! - `orders`, `order_items` - Rental orders and their lines
//! - `invoices` - One invoice per order
//! - `blog_posts` - Published articles
//! - `system_config` - Key/value JSON settings (event calculator)
//! - `shipping_config` - Single-row shipping bands
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p resona-cli -- migrate
//! ```

pub mod blog;
pub mod categories;
pub mod invoices;
pub mod orders;
pub mod packs;
pub mod products;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use resona_core::order::DocumentKind;

pub use blog::BlogRepository;
pub use categories::CategoryRepository;
pub use invoices::InvoiceRepository;
pub use orders::OrderRepository;
pub use packs::PackRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Serialize document numbering for one kind within a transaction.
///
/// Held until the transaction ends, so two concurrent orders never read the
/// same "latest" number.
/// Highest sequence issued for `kind` in `year`, compared numerically so
/// `RES-2025-10000` ranks above `RES-2025-9999`.
pub(crate) async fn latest_sequence(
    conn: &mut sqlx::PgConnection,
    table: &str,
    column: &str,
    kind: DocumentKind,
    year: i32,
) -> Result<Option<u32>, RepositoryError> {
    let sql = format!(
        "SELECT MAX(split_part({column}, '-', 3)::bigint) FROM {table} WHERE {column} ~ $1"
    );
    let latest: Option<i64> = sqlx::query_scalar(&sql)
        .bind(kind.sequence_pattern(year))
        .fetch_one(conn)
        .await?;
    latest
        .map(u32::try_from)
        .transpose()
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} sequence out of range")))
}

pub(crate) async fn lock_numbering(
    conn: &mut sqlx::PgConnection,
    key: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}
