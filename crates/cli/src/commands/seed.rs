//! Seed default configuration.
//!
//! Inserts the rows the API expects to exist: the hidden Montaje category,
//! the shipping bands and the event calculator configuration. Existing rows
//! are left alone, so the command is safe to re-run.
//!
//! # YAML Format
//!
//! ```yaml
//! shipping:
//!   local_zone_max: "10"
//!   local_zone_rate: "15"
//!   # ... every ShippingConfig field
//! calculator:
//!   eventTypes: [...]
//!   servicePrices: {...}
//! ```
//!
//! Values from the file replace the built-in defaults but are still only
//! inserted when no row exists.

use std::path::Path;

use serde::Deserialize;

use resona_api::db::{CategoryRepository, SettingsRepository};
use resona_api::models::CalculatorConfig;
use resona_api::models::calculator::CALCULATOR_CONFIG_KEY;
use resona_core::pricing::ShippingConfig;

use super::{CommandError, connect};

/// Overrides read from a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub shipping: Option<ShippingConfig>,
    #[serde(default)]
    pub calculator: Option<CalculatorConfig>,
}

impl SeedFile {
    /// Read and validate a seed file.
    pub fn load(path: &Path) -> Result<Self, CommandError> {
        let content = std::fs::read_to_string(path)?;
        let file: Self = serde_yaml::from_str(&content)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), CommandError> {
        if let Some(shipping) = &self.shipping {
            shipping
                .validate()
                .map_err(|e| CommandError::Invalid(format!("shipping: {e}")))?;
        }
        if let Some(calculator) = &self.calculator {
            calculator
                .validate()
                .map_err(|e| CommandError::Invalid(format!("calculator: {e}")))?;
        }
        Ok(())
    }
}

/// Seed missing configuration rows.
pub async fn run(file: Option<&str>) -> Result<(), CommandError> {
    let seed = match file {
        Some(path) => {
            tracing::info!("Reading seed file {path}");
            SeedFile::load(Path::new(path))?
        }
        None => SeedFile::default(),
    };

    let pool = connect().await?;

    let montaje = CategoryRepository::new(&pool).ensure_montaje().await?;
    tracing::info!(category_id = %montaje.id, "Montaje category ready");

    let settings = SettingsRepository::new(&pool);

    let shipping = seed.shipping.unwrap_or_default();
    if settings.init_shipping_config(&shipping).await? {
        tracing::info!("Shipping configuration inserted");
    } else {
        tracing::info!("Shipping configuration already present, skipped");
    }

    let calculator = serde_json::to_value(seed.calculator.unwrap_or_default())?;
    if settings.init_json(CALCULATOR_CONFIG_KEY, &calculator).await? {
        tracing::info!("Calculator configuration inserted");
    } else {
        tracing::info!("Calculator configuration already present, skipped");
    }

    tracing::info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let file: SeedFile = serde_yaml::from_str("{}").unwrap();
        assert!(file.shipping.is_none());
        assert!(file.calculator.is_none());
        assert!(file.validate().is_ok());
    }

    #[test]
    fn invalid_shipping_bands_are_rejected() {
        let mut shipping = ShippingConfig::default();
        shipping.regional_zone_max = shipping.local_zone_max - rust_decimal::Decimal::ONE;
        let file = SeedFile {
            shipping: Some(shipping),
            calculator: None,
        };
        assert!(matches!(file.validate(), Err(CommandError::Invalid(msg)) if msg.starts_with("shipping")));
    }

    #[test]
    fn invalid_calculator_is_rejected() {
        let mut calculator = CalculatorConfig::default();
        calculator.event_types.clear();
        let file = SeedFile {
            shipping: None,
            calculator: Some(calculator),
        };
        assert!(matches!(file.validate(), Err(CommandError::Invalid(msg)) if msg.starts_with("calculator")));
    }
}
