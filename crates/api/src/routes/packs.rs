//! Pack route handlers.

use axum::{Json, extract::State};
use chrono::Utc;

use resona_core::PackId;

use super::products::AvailabilityQuery;
use crate::db::PackRepository;
use crate::error::{AppError, Result};
use crate::extract::{PathParam, QueryParams};
use crate::middleware::RequireAdmin;
use crate::models::{Pack, PackWithItems};
use crate::services::inventory::{self, PackAvailabilityView};
use crate::services::packs::{self, PackPricingView};
use crate::state::AppState;

/// List active packs.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Pack>>> {
    let packs = PackRepository::new(state.pool()).list_active().await?;
    Ok(Json(packs))
}

/// Pack with its components.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<PackId>,
) -> Result<Json<PackWithItems>> {
    let pack = packs::load(state.pool(), id).await?;
    if !pack.pack.is_active {
        return Err(AppError::NotFound(format!("pack {id}")));
    }
    Ok(Json(pack))
}

/// Recomputed price breakdown.
pub async fn pricing(
    State(state): State<AppState>,
    PathParam(id): PathParam<PackId>,
) -> Result<Json<PackPricingView>> {
    Ok(Json(packs::pricing(state.pool(), id).await?))
}

/// Store the recomputed price.
pub async fn recalculate(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    PathParam(id): PathParam<PackId>,
) -> Result<Json<Pack>> {
    Ok(Json(packs::recalculate(state.pool(), id).await?))
}

/// How many copies of the pack can be rented over a date range.
pub async fn availability(
    State(state): State<AppState>,
    PathParam(id): PathParam<PackId>,
    QueryParams(query): QueryParams<AvailabilityQuery>,
) -> Result<Json<PackAvailabilityView>> {
    let view = inventory::pack_availability(
        state.pool(),
        id,
        query.start,
        query.end,
        query.quantity,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(view))
}
