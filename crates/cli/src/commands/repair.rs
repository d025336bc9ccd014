//! Repair passes for the violations `check` reports.
//!
//! Each pass walks its rows independently: a failing row is logged and
//! counted, and the pass moves on. With `--dry-run` nothing is written.

use rust_decimal::Decimal;
use sqlx::PgPool;

use resona_api::db::{CategoryRepository, OrderRepository, PackRepository, ProductRepository};
use resona_api::models::Pack;
use resona_core::ProductId;
use resona_core::integrity::{MontajeFix, check_order_deposit, check_pack_price, montaje_fix};
use resona_core::pricing::{calculate_deposit, calculate_pack_price};

use super::{CommandError, RepairSummary, connect};

/// Zero deposits on VIP orders, or with `all` recompute every order's
/// deposit from its lines.
pub async fn deposits(dry_run: bool, all: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let orders = OrderRepository::new(&pool);
    let mut summary = RepairSummary::default();

    for row in orders.deposits().await? {
        summary.checked += 1;

        let target = if all {
            match orders.deposit_lines(row.order_id).await {
                Ok(lines) => calculate_deposit(row.user_level, &lines).amount,
                Err(e) => {
                    tracing::error!(order_id = %row.order_id, error = %e, "Failed to load order lines");
                    summary.failed += 1;
                    continue;
                }
            }
        } else if check_order_deposit(row.order_id, row.user_level, row.deposit_amount).is_some() {
            Decimal::ZERO
        } else {
            continue;
        };

        if target == row.deposit_amount {
            continue;
        }

        tracing::info!(
            order_id = %row.order_id,
            order_number = %row.order_number,
            level = %row.user_level,
            from = %row.deposit_amount,
            to = %target,
            dry_run,
            "Deposit corrected"
        );
        if dry_run {
            summary.fixed += 1;
            continue;
        }
        match orders.set_deposit(row.order_id, target).await {
            Ok(()) => summary.fixed += 1,
            Err(e) => {
                tracing::error!(order_id = %row.order_id, error = %e, "Failed to update deposit");
                summary.failed += 1;
            }
        }
    }

    summary.finish("deposits", dry_run)
}

/// Backfill null `real_stock` and clamp `available_stock`.
pub async fn stock(dry_run: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let mut summary = RepairSummary::default();

    for product in ProductRepository::new(&pool).list_all().await? {
        summary.checked += 1;
        if product.stock_levels().problems().is_empty() {
            continue;
        }
        if dry_run {
            let (_, fixes) = product.stock_levels().repair();
            tracing::info!(product_id = %product.id, ?fixes, dry_run, "Stock corrected");
            summary.fixed += 1;
            continue;
        }
        match repair_product_stock(&pool, product.id).await {
            Ok(true) => summary.fixed += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(product_id = %product.id, error = %e, "Failed to repair stock");
                summary.failed += 1;
            }
        }
    }

    summary.finish("stock", dry_run)
}

/// Re-read the product under lock so concurrent orders are not overwritten.
async fn repair_product_stock(pool: &PgPool, id: ProductId) -> Result<bool, CommandError> {
    let mut tx = pool.begin().await?;

    let Some(product) = ProductRepository::lock_for_update(&mut *tx, &[id])
        .await?
        .into_iter()
        .next()
    else {
        return Ok(false);
    };

    let (levels, fixes) = product.stock_levels().repair();
    if fixes.is_empty() {
        return Ok(false);
    }
    ProductRepository::set_stock_levels(&mut *tx, id, &levels).await?;
    tx.commit().await?;

    tracing::info!(product_id = %id, ?fixes, "Stock corrected");
    Ok(true)
}

/// Store the recomputed price of auto-calculated packs that drifted.
pub async fn pack_prices(dry_run: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let packs = PackRepository::new(&pool);
    let mut summary = RepairSummary::default();

    for pack in packs.list_all().await? {
        summary.checked += 1;
        match reprice(&packs, &pack, dry_run).await {
            Ok(true) => summary.fixed += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(pack_id = %pack.id, error = %e, "Failed to reprice pack");
                summary.failed += 1;
            }
        }
    }

    summary.finish("pack-prices", dry_run)
}

async fn reprice(
    packs: &PackRepository<'_>,
    pack: &Pack,
    dry_run: bool,
) -> Result<bool, CommandError> {
    let items = packs.items(pack.id).await?;
    let input = pack.pricing_input(&items);
    let invalid = |e: resona_core::pricing::PricingError| CommandError::Invalid(e.to_string());

    let Some(violation) =
        check_pack_price(pack.id, pack.auto_calculate, pack.final_price, &input).map_err(invalid)?
    else {
        return Ok(false);
    };

    tracing::info!(dry_run, "{violation}");
    if !dry_run {
        let pricing = calculate_pack_price(&input).map_err(invalid)?;
        packs.update_pricing(pack.id, &pricing).await?;
    }
    Ok(true)
}

/// Align each pack's category enum with its category reference.
pub async fn montaje(dry_run: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let montaje = CategoryRepository::new(&pool)
        .montaje()
        .await?
        .ok_or_else(|| CommandError::Invalid("Montaje category missing, run `resona seed`".into()))?;

    let packs = PackRepository::new(&pool);
    let mut summary = RepairSummary::default();

    for pack in packs.list_all().await? {
        summary.checked += 1;
        let Some(fix) = montaje_fix(pack.category, pack.category_ref, montaje.id) else {
            continue;
        };

        tracing::info!(pack_id = %pack.id, ?fix, dry_run, "Pack category corrected");
        if dry_run {
            summary.fixed += 1;
            continue;
        }

        let result = match fix {
            MontajeFix::Category(category) => packs.set_category(pack.id, category).await,
            MontajeFix::CategoryRef(category_ref) => {
                packs.set_category_ref(pack.id, category_ref).await
            }
        };
        match result {
            Ok(()) => summary.fixed += 1,
            Err(e) => {
                tracing::error!(pack_id = %pack.id, error = %e, "Failed to update pack category");
                summary.failed += 1;
            }
        }
    }

    summary.finish("montaje", dry_run)
}
