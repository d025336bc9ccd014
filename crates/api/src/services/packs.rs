//! Pack pricing on top of stored packs.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use resona_core::PackId;
use resona_core::pricing::{PackPricing, calculate_pack_price};

use crate::db::PackRepository;
use crate::error::{AppError, Result};
use crate::models::{Pack, PackWithItems};

/// A freshly computed breakdown next to what is stored.
#[derive(Debug, Clone, Serialize)]
pub struct PackPricingView {
    pub pack_id: PackId,
    pub stored_final_price: Decimal,
    /// Stored price differs from the recomputed one.
    pub out_of_date: bool,
    pub pricing: PackPricing,
}

/// Load a pack with its components.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the pack does not exist.
pub async fn load(pool: &PgPool, pack_id: PackId) -> Result<PackWithItems> {
    let repo = PackRepository::new(pool);
    let pack = repo
        .get(pack_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pack {pack_id}")))?;
    let items = repo.items(pack_id).await?;
    Ok(PackWithItems { pack, items })
}

/// Recompute a pack's price without storing it.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown packs and `AppError::Pricing`
/// for invalid components.
pub async fn pricing(pool: &PgPool, pack_id: PackId) -> Result<PackPricingView> {
    let PackWithItems { pack, items } = load(pool, pack_id).await?;
    let pricing = calculate_pack_price(&pack.pricing_input(&items))?;
    Ok(PackPricingView {
        pack_id,
        stored_final_price: pack.final_price,
        out_of_date: pricing.final_price != pack.final_price,
        pricing,
    })
}

/// Recompute and store a pack's price.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown packs and `AppError::Pricing`
/// for invalid components.
pub async fn recalculate(pool: &PgPool, pack_id: PackId) -> Result<Pack> {
    let PackWithItems { pack, items } = load(pool, pack_id).await?;
    let pricing = calculate_pack_price(&pack.pricing_input(&items))?;
    let updated = PackRepository::new(pool)
        .update_pricing(pack_id, &pricing)
        .await?;

    tracing::info!(
        pack_id = %pack_id,
        previous = %pack.final_price,
        final_price = %updated.final_price,
        custom = pricing.custom_price_enabled,
        "Pack price recalculated"
    );
    Ok(updated)
}
