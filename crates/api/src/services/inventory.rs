//! Stock adjustments and date-range availability.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use resona_core::stock::{
    self, AvailabilityCheck, ComponentStock, DayAvailability, ProductAvailability,
    StockOperation,
};
use resona_core::{PackId, ProductId};

use crate::db::{PackRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::Product;

/// Availability of one product over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct ProductAvailabilityView {
    pub product_id: ProductId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub check: AvailabilityCheck,
    pub calendar: Vec<DayAvailability>,
}

/// One component's share of a pack availability answer.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentAvailability {
    pub product_id: ProductId,
    pub product_name: String,
    pub per_pack: i32,
    pub required: i32,
    pub available: i32,
}

/// Availability of a pack over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct PackAvailabilityView {
    pub pack_id: PackId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub requested: i32,
    /// Whole packs that can be assembled; `None` for an empty pack.
    pub available_packs: Option<i32>,
    pub is_available: bool,
    pub advance_booking: bool,
    pub components: Vec<ComponentAvailability>,
}

/// Apply a manual stock increase or decrease.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown products and
/// `AppError::Stock` when the adjustment is rejected.
pub async fn adjust_stock(
    pool: &PgPool,
    product_id: ProductId,
    operation: StockOperation,
    quantity: i32,
) -> Result<Product> {
    let mut tx = pool.begin().await?;

    let mut product = ProductRepository::lock_for_update(&mut *tx, &[product_id])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let levels = product.stock_levels().adjust(operation, quantity)?;
    ProductRepository::set_stock_levels(&mut *tx, product_id, &levels).await?;
    tx.commit().await?;

    tracing::info!(
        product_id = %product_id,
        ?operation,
        quantity,
        available_stock = levels.available_stock,
        "Stock adjusted"
    );

    product.stock = levels.stock;
    product.real_stock = levels.real_stock;
    product.available_stock = levels.available_stock;
    product.status = levels.status;
    Ok(product)
}

/// Availability and per-day calendar of a product.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown products and `AppError::Stock`
/// for invalid ranges, quantities or lead-time violations.
pub async fn product_availability(
    pool: &PgPool,
    product_id: ProductId,
    start: NaiveDate,
    end: NaiveDate,
    quantity: i32,
    today: NaiveDate,
) -> Result<ProductAvailabilityView> {
    let repo = ProductRepository::new(pool);
    let product = repo
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let reservations = repo.reservations(product_id, start, end).await?;
    let physical = product.stock_levels().physical();
    let check = stock::check_availability(
        &ProductAvailability {
            physical,
            stock_status: product.stock_status,
            lead_time_days: product.lead_time_days,
            reservations: &reservations,
        },
        start,
        end,
        quantity,
        today,
    )?;
    let calendar = stock::calendar(physical, &reservations, start, end)?;

    Ok(ProductAvailabilityView {
        product_id,
        start,
        end,
        check,
        calendar,
    })
}

/// How many copies of a pack can be rented over a date range.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown packs and `AppError::Stock` for
/// invalid ranges, quantities or component lead-time violations.
pub async fn pack_availability(
    pool: &PgPool,
    pack_id: PackId,
    start: NaiveDate,
    end: NaiveDate,
    packs: i32,
    today: NaiveDate,
) -> Result<PackAvailabilityView> {
    if packs < 1 {
        return Err(stock::StockError::InvalidQuantity(packs).into());
    }
    PackRepository::new(pool)
        .get(pack_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pack {pack_id}")))?;

    let items = PackRepository::new(pool).items(pack_id).await?;
    let product_repo = ProductRepository::new(pool);
    let ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
    let reservations = product_repo.reservations_for(&ids, start, end).await?;

    let mut components = Vec::with_capacity(items.len());
    let mut stocks = Vec::with_capacity(items.len());
    for (item, (_, held)) in items.iter().zip(&reservations) {
        let product = product_repo
            .get(item.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", item.product_id)))?;

        stock::check_lead_time(product.stock_status, product.lead_time_days, start, today)?;
        let available =
            stock::available_for_range(product.stock_levels().physical(), held, start, end)?;
        let component = ComponentStock {
            per_pack: item.quantity,
            available,
        };
        stocks.push(component);
        components.push(ComponentAvailability {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            per_pack: item.quantity,
            required: component.required(packs),
            available,
        });
    }

    let available_packs = stock::packs_available(&stocks);
    let advance_booking = stock::is_advance_booking(start, today);
    let is_available = advance_booking || available_packs.is_some_and(|n| n >= packs);

    Ok(PackAvailabilityView {
        pack_id,
        start,
        end,
        requested: packs,
        available_packs,
        is_available,
        advance_booking,
        components,
    })
}
