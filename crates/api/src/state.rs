//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use resona_core::pricing::ShippingConfig;

use crate::config::ApiConfig;
use crate::db::{RepositoryError, SettingsRepository};

const SHIPPING_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    shipping_config: Cache<(), ShippingConfig>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let shipping_config = Cache::builder()
            .max_capacity(1)
            .time_to_live(SHIPPING_CONFIG_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shipping_config,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The shipping configuration, cached for five minutes.
    ///
    /// Falls back to the built-in defaults when none has been seeded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn shipping_config(&self) -> Result<ShippingConfig, RepositoryError> {
        if let Some(config) = self.inner.shipping_config.get(&()).await {
            return Ok(config);
        }

        let config = SettingsRepository::new(self.pool())
            .shipping_config()
            .await?
            .unwrap_or_else(|| {
                tracing::warn!("No shipping config stored, using defaults");
                ShippingConfig::default()
            });
        self.inner
            .shipping_config
            .insert((), config.clone())
            .await;
        Ok(config)
    }

    /// Drop the cached shipping configuration after it changes.
    pub async fn invalidate_shipping_config(&self) {
        self.inner.shipping_config.invalidate(&()).await;
    }
}
