use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Category;
use crate::models::category::MONTAJE_SLUG;

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Categories shown to customers. Hidden ones (Montaje) are excluded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_visible(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, description, is_hidden, sort_order
            FROM categories
            WHERE NOT is_hidden AND slug <> $1
            ORDER BY sort_order, name
            ",
        )
        .bind(MONTAJE_SLUG)
        .fetch_all(self.pool)
        .await?)
    }

    /// The Montaje category, if it has been seeded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn montaje(&self) -> Result<Option<Category>, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, description, is_hidden, sort_order
            FROM categories
            WHERE slug = $1
            ",
        )
        .bind(MONTAJE_SLUG)
        .fetch_optional(self.pool)
        .await?)
    }

    /// Create the Montaje category, or make sure the existing one is hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure_montaje(&self) -> Result<Category, RepositoryError> {
        Ok(sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, slug, description, is_hidden, sort_order)
            VALUES ('Montaje', $1, 'Installation and transport add-ons', TRUE, 999)
            ON CONFLICT (slug) DO UPDATE SET is_hidden = TRUE, updated_at = NOW()
            RETURNING id, name, slug, description, is_hidden, sort_order
            ",
        )
        .bind(MONTAJE_SLUG)
        .fetch_one(self.pool)
        .await?)
    }
}
