//! Shipping configuration and quotes.

use axum::{Json, extract::State};

use resona_core::pricing::{ShippingConfig, ShippingQuote, ShippingRequest, quote_shipping};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Current shipping bands.
pub async fn config(State(state): State<AppState>) -> Result<Json<ShippingConfig>> {
    Ok(Json(state.shipping_config().await?))
}

/// Replace the shipping bands. Configs that could price a longer trip below
/// a shorter one are rejected.
pub async fn update_config(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    JsonBody(config): JsonBody<ShippingConfig>,
) -> Result<Json<ShippingConfig>> {
    config.validate()?;
    SettingsRepository::new(state.pool())
        .save_shipping_config(&config)
        .await?;
    state.invalidate_shipping_config().await;

    tracing::info!(base_address = %config.base_address, "Shipping config updated");
    Ok(Json(config))
}

/// Price a delivery.
pub async fn quote(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ShippingRequest>,
) -> Result<Json<ShippingQuote>> {
    let config = state.shipping_config().await?;
    Ok(Json(quote_shipping(&config, &request)?))
}
