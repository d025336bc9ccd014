//! Event calculator configuration.

use axum::{Json, extract::State};

use crate::db::{RepositoryError, SettingsRepository};
use crate::error::{AppError, Result};
use crate::extract::JsonBody;
use crate::middleware::RequireAdmin;
use crate::models::CalculatorConfig;
use crate::models::calculator::CALCULATOR_CONFIG_KEY;
use crate::state::AppState;

/// The stored calculator document, or the defaults when none is stored.
pub async fn config(State(state): State<AppState>) -> Result<Json<CalculatorConfig>> {
    let stored = SettingsRepository::new(state.pool())
        .get_json(CALCULATOR_CONFIG_KEY)
        .await?;
    let config = match stored {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            RepositoryError::DataCorruption(format!("{CALCULATOR_CONFIG_KEY}: {e}"))
        })?,
        None => CalculatorConfig::default(),
    };
    Ok(Json(config))
}

/// Replace the calculator document.
pub async fn update_config(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    JsonBody(config): JsonBody<CalculatorConfig>,
) -> Result<Json<CalculatorConfig>> {
    config.validate().map_err(AppError::BadRequest)?;
    let value =
        serde_json::to_value(&config).map_err(|e| AppError::Internal(e.to_string()))?;
    SettingsRepository::new(state.pool())
        .set_json(CALCULATOR_CONFIG_KEY, &value)
        .await?;

    tracing::info!(event_types = config.event_types.len(), "Calculator config updated");
    Ok(Json(config))
}
