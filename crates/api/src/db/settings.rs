//! Key/value settings and the single-row shipping configuration.

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use resona_core::pricing::ShippingConfig;

use super::RepositoryError;

/// Internal row type for `shipping_config`.
#[derive(Debug, sqlx::FromRow)]
struct ShippingConfigRow {
    local_zone_max: Decimal,
    local_zone_rate: Decimal,
    regional_zone_max: Decimal,
    regional_zone_rate: Decimal,
    extended_zone_max: Decimal,
    extended_zone_rate: Decimal,
    custom_zone_rate_per_km: Decimal,
    minimum_shipping_cost: Decimal,
    minimum_with_installation: Decimal,
    base_address: String,
    urgent_surcharge: Decimal,
    night_surcharge: Decimal,
}

impl From<ShippingConfigRow> for ShippingConfig {
    fn from(row: ShippingConfigRow) -> Self {
        Self {
            local_zone_max: row.local_zone_max,
            local_zone_rate: row.local_zone_rate,
            regional_zone_max: row.regional_zone_max,
            regional_zone_rate: row.regional_zone_rate,
            extended_zone_max: row.extended_zone_max,
            extended_zone_rate: row.extended_zone_rate,
            custom_zone_rate_per_km: row.custom_zone_rate_per_km,
            minimum_shipping_cost: row.minimum_shipping_cost,
            minimum_with_installation: row.minimum_with_installation,
            base_address: row.base_address,
            urgent_surcharge: row.urgent_surcharge,
            night_surcharge: row.night_surcharge,
        }
    }
}

/// Repository for `system_config` and `shipping_config`.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a JSON setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_json(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        Ok(
            sqlx::query_scalar::<_, JsonValue>("SELECT value FROM system_config WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?,
        )
    }

    /// Insert or replace a JSON setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_json(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO system_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Insert a JSON setting only if the key is absent. Returns whether it
    /// was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn init_json(&self, key: &str, value: &JsonValue) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO system_config (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The stored shipping configuration, if it has been seeded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shipping_config(&self) -> Result<Option<ShippingConfig>, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingConfigRow>(
            r"
            SELECT local_zone_max, local_zone_rate, regional_zone_max, regional_zone_rate,
                   extended_zone_max, extended_zone_rate, custom_zone_rate_per_km,
                   minimum_shipping_cost, minimum_with_installation, base_address,
                   urgent_surcharge, night_surcharge
            FROM shipping_config
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(ShippingConfig::from))
    }

    /// Store the shipping configuration, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_shipping_config(&self, config: &ShippingConfig) -> Result<(), RepositoryError> {
        self.write_shipping_config(config, true).await.map(|_| ())
    }

    /// Store the shipping configuration only if none exists. Returns whether
    /// it was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn init_shipping_config(
        &self,
        config: &ShippingConfig,
    ) -> Result<bool, RepositoryError> {
        self.write_shipping_config(config, false).await
    }

    async fn write_shipping_config(
        &self,
        config: &ShippingConfig,
        overwrite: bool,
    ) -> Result<bool, RepositoryError> {
        let on_conflict = if overwrite {
            r"DO UPDATE SET
                local_zone_max = EXCLUDED.local_zone_max,
                local_zone_rate = EXCLUDED.local_zone_rate,
                regional_zone_max = EXCLUDED.regional_zone_max,
                regional_zone_rate = EXCLUDED.regional_zone_rate,
                extended_zone_max = EXCLUDED.extended_zone_max,
                extended_zone_rate = EXCLUDED.extended_zone_rate,
                custom_zone_rate_per_km = EXCLUDED.custom_zone_rate_per_km,
                minimum_shipping_cost = EXCLUDED.minimum_shipping_cost,
                minimum_with_installation = EXCLUDED.minimum_with_installation,
                base_address = EXCLUDED.base_address,
                urgent_surcharge = EXCLUDED.urgent_surcharge,
                night_surcharge = EXCLUDED.night_surcharge,
                updated_at = NOW()"
        } else {
            "DO NOTHING"
        };
        let sql = format!(
            r"
            INSERT INTO shipping_config (
                id, local_zone_max, local_zone_rate, regional_zone_max, regional_zone_rate,
                extended_zone_max, extended_zone_rate, custom_zone_rate_per_km,
                minimum_shipping_cost, minimum_with_installation, base_address,
                urgent_surcharge, night_surcharge
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) {on_conflict}
            "
        );
        let result = sqlx::query(&sql)
            .bind(config.local_zone_max)
            .bind(config.local_zone_rate)
            .bind(config.regional_zone_max)
            .bind(config.regional_zone_rate)
            .bind(config.extended_zone_max)
            .bind(config.extended_zone_rate)
            .bind(config.custom_zone_rate_per_km)
            .bind(config.minimum_shipping_cost)
            .bind(config.minimum_with_installation)
            .bind(&config.base_address)
            .bind(config.urgent_surcharge)
            .bind(config.night_surcharge)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
