//! Product route handlers.

use axum::{Json, extract::State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use resona_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::RequireAdmin;
use crate::models::{Product, StockUpdateInput};
use crate::services::inventory::{self, ProductAvailabilityView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
}

/// Date range and quantity of an availability query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AvailabilityQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// List active products.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let category = filter.category.as_deref().filter(|c| !c.is_empty());
    let products = ProductRepository::new(state.pool())
        .list_active(category)
        .await?;
    Ok(Json(products))
}

/// Product detail. Inactive products are not found.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|p| p.is_active)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Availability over a date range with a per-day calendar.
pub async fn availability(
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
    QueryParams(query): QueryParams<AvailabilityQuery>,
) -> Result<Json<ProductAvailabilityView>> {
    let view = inventory::product_availability(
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

/// Increase or decrease stock.
pub async fn adjust_stock(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
    JsonBody(input): JsonBody<StockUpdateInput>,
) -> Result<Json<Product>> {
    let product =
        inventory::adjust_stock(state.pool(), id, input.operation, input.quantity).await?;
    Ok(Json(product))
}
