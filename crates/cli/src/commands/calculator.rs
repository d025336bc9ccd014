//! Event calculator configuration export/import.
//!
//! The configuration lives as JSON in `system_config`; operators edit it as
//! YAML and import it back after validation.

use std::path::Path;

use resona_api::db::SettingsRepository;
use resona_api::models::CalculatorConfig;
use resona_api::models::calculator::CALCULATOR_CONFIG_KEY;

use super::{CommandError, connect};

/// Parse and validate a YAML calculator configuration.
pub fn parse(content: &str) -> Result<CalculatorConfig, CommandError> {
    let config: CalculatorConfig = serde_yaml::from_str(content)?;
    config.validate().map_err(CommandError::Invalid)?;
    Ok(config)
}

/// Write the stored configuration (or the default when none is stored).
pub async fn export(path: &str) -> Result<(), CommandError> {
    let pool = connect().await?;

    let config = match SettingsRepository::new(&pool)
        .get_json(CALCULATOR_CONFIG_KEY)
        .await?
    {
        Some(value) => serde_json::from_value::<CalculatorConfig>(value)?,
        None => {
            tracing::warn!("No calculator configuration stored, exporting the default");
            CalculatorConfig::default()
        }
    };

    std::fs::write(Path::new(path), serde_yaml::to_string(&config)?)?;
    tracing::info!(event_types = config.event_types.len(), "Calculator configuration written to {path}");
    Ok(())
}

/// Replace the stored configuration with the file's content.
pub async fn import(path: &str) -> Result<(), CommandError> {
    let content = std::fs::read_to_string(Path::new(path))?;
    let config = parse(&content)?;

    let pool = connect().await?;
    SettingsRepository::new(&pool)
        .set_json(CALCULATOR_CONFIG_KEY, &serde_json::to_value(&config)?)
        .await?;

    tracing::info!(event_types = config.event_types.len(), "Calculator configuration imported");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_survives_yaml() {
        let yaml = serde_yaml::to_string(&CalculatorConfig::default()).unwrap();
        assert!(yaml.contains("eventTypes"));
        let parsed = parse(&yaml).unwrap();
        assert_eq!(parsed.event_types.len(), CalculatorConfig::default().event_types.len());
    }

    #[test]
    fn rejects_config_without_event_types() {
        let yaml = "eventTypes: []\nservicePrices:\n  sound: {basic: 1, intermediate: 2, professional: 3, premium: 4}\n  lighting: {basic: 1, intermediate: 2, professional: 3, premium: 4}\n";
        assert!(matches!(parse(yaml), Err(CommandError::Invalid(_))));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(parse("eventTypes: {"), Err(CommandError::Yaml(_))));
    }
}
