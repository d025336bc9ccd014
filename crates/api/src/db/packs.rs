//! Pack queries and stored pricing.

use sqlx::PgPool;

use resona_core::pricing::PackPricing;
use resona_core::{CategoryId, PackCategory, PackId};

use super::RepositoryError;
use crate::models::{Pack, PackItem};

const PACK_COLUMNS: &str = r"
    id, name, slug, description, category, category_ref, price_extra,
    include_shipping, include_installation, discount_percentage, discount_amount,
    custom_price_enabled, auto_calculate, base_price_per_day, base_shipping_cost,
    base_installation_cost, calculated_total_price, final_price, savings_amount,
    savings_percentage, is_active, created_at, updated_at
";

/// Repository for pack database operations.
pub struct PackRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PackRepository<'a> {
    /// Create a new pack repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active packs outside the hidden Montaje category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Pack>, RepositoryError> {
        let sql = format!(
            "SELECT {PACK_COLUMNS} FROM packs WHERE is_active AND category <> $1 ORDER BY name"
        );
        Ok(sqlx::query_as::<_, Pack>(&sql)
            .bind(PackCategory::Montaje)
            .fetch_all(self.pool)
            .await?)
    }

    /// Every pack. Used by the integrity checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Pack>, RepositoryError> {
        let sql = format!("SELECT {PACK_COLUMNS} FROM packs ORDER BY id");
        Ok(sqlx::query_as::<_, Pack>(&sql).fetch_all(self.pool).await?)
    }

    /// Get a pack by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PackId) -> Result<Option<Pack>, RepositoryError> {
        let sql = format!("SELECT {PACK_COLUMNS} FROM packs WHERE id = $1");
        Ok(sqlx::query_as::<_, Pack>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Components of a pack with the product fields pricing needs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, pack_id: PackId) -> Result<Vec<PackItem>, RepositoryError> {
        Ok(sqlx::query_as::<_, PackItem>(
            r"
            SELECT pi.product_id, p.name AS product_name, pi.quantity,
                   p.price_per_day, p.shipping_cost, p.installation_cost
            FROM pack_items pi
            JOIN products p ON p.id = pi.product_id
            WHERE pi.pack_id = $1
            ORDER BY pi.id
            ",
        )
        .bind(pack_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Store a computed price breakdown.
    ///
    /// A custom `final_price` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the pack does not exist.
    pub async fn update_pricing(
        &self,
        id: PackId,
        pricing: &PackPricing,
    ) -> Result<Pack, RepositoryError> {
        let sql = format!(
            r"
            UPDATE packs SET
                base_price_per_day = $2,
                base_shipping_cost = $3,
                base_installation_cost = $4,
                calculated_total_price = $5,
                discount_percentage = $6,
                discount_amount = $7,
                final_price = CASE WHEN custom_price_enabled AND final_price > 0
                                   THEN final_price ELSE $8 END,
                savings_amount = $9,
                savings_percentage = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PACK_COLUMNS}
            "
        );
        sqlx::query_as::<_, Pack>(&sql)
            .bind(id)
            .bind(pricing.base_price_per_day)
            .bind(pricing.base_shipping_cost)
            .bind(pricing.base_installation_cost)
            .bind(pricing.calculated_total_price)
            .bind(pricing.discount_percentage)
            .bind(pricing.discount_amount)
            .bind(pricing.final_price)
            .bind(pricing.savings_amount)
            .bind(pricing.savings_percentage)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Set the category enum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the pack does not exist.
    pub async fn set_category(
        &self,
        id: PackId,
        category: PackCategory,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE packs SET category = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(category)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set the category reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the pack does not exist.
    pub async fn set_category_ref(
        &self,
        id: PackId,
        category_ref: CategoryId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE packs SET category_ref = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(category_ref)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
