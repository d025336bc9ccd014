//! Order creation, status changes, cancellation and invoicing.
//!
//! Every operation runs in one transaction. Product rows are locked with
//! `SELECT ... FOR UPDATE` in id order before stock counters are read, so
//! concurrent orders for the same product serialize instead of overselling.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use resona_core::order::{
    self, CancellationRefund, INVOICE_DUE_DAYS, cancellation_refund, holds_reservation,
};
use resona_core::pricing::{
    self, DepositLine, ShippingCostLine, ShippingRequest, calculate_deposit, order_totals,
    quote_shipping,
};
use resona_core::stock::{check_lead_time, is_advance_booking};
use resona_core::{DeliveryType, OrderId, OrderStatus, PaymentStatus, ProductId, ProductStatus};

use crate::db::invoices::NewInvoice;
use crate::db::orders::{NewOrder, NewOrderItem};
use crate::db::{InvoiceRepository, OrderRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{CancelOrderInput, CreateOrderInput, Invoice, Order, OrderWithItems, Product};
use crate::state::AppState;

/// Result of a cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub order: Order,
    pub refund: CancellationRefund,
}

/// Check the parts of an order request that need no database access.
///
/// # Errors
///
/// Returns `AppError::BadRequest` describing the first problem found.
pub fn validate_order_input(input: &CreateOrderInput, today: NaiveDate) -> Result<()> {
    if input.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_string()));
    }
    if input.end_date < input.start_date {
        return Err(pricing::PricingError::InvalidDates {
            start: input.start_date,
            end: input.end_date,
        }
        .into());
    }
    if input.start_date < today {
        return Err(AppError::BadRequest(format!(
            "start date {} is in the past",
            input.start_date
        )));
    }

    let mut seen = HashSet::new();
    for line in &input.items {
        if line.quantity < 1 {
            return Err(pricing::PricingError::InvalidQuantity(line.quantity).into());
        }
        if !seen.insert(line.product_id) {
            return Err(AppError::BadRequest(format!(
                "product {} is listed more than once",
                line.product_id
            )));
        }
    }

    if let Some(distance) = input.distance_km {
        pricing::check_distance(distance)?;
    }
    if input.delivery_type == DeliveryType::Delivery {
        if input.distance_km.is_none() {
            return Err(AppError::BadRequest(
                "distance_km is required for delivery".to_string(),
            ));
        }
        if input
            .delivery_address
            .as_deref()
            .is_none_or(|a| a.trim().is_empty())
        {
            return Err(AppError::BadRequest(
                "delivery_address is required for delivery".to_string(),
            ));
        }
    }
    Ok(())
}

fn rentable(product: &Product) -> Result<()> {
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {}", product.id)));
    }
    if matches!(
        product.status,
        ProductStatus::Maintenance | ProductStatus::Discontinued
    ) {
        return Err(AppError::Conflict(format!(
            "{} is not available for rental ({})",
            product.name, product.status
        )));
    }
    Ok(())
}

/// Create an order: price the lines, apply the tier discount, tax, delivery
/// and deposit, and reserve stock.
///
/// Bookings starting more than 30 days out skip the stock check and do not
/// reserve units.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid input, `AppError::NotFound` for
/// unknown users or products and `AppError::Stock` when stock is short.
pub async fn create_order(
    state: &AppState,
    input: CreateOrderInput,
    today: NaiveDate,
) -> Result<OrderWithItems> {
    validate_order_input(&input, today)?;

    let user = UserRepository::new(state.pool())
        .get(input.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", input.user_id)))?;

    let shipping_config = if input.delivery_type == DeliveryType::Delivery {
        Some(state.shipping_config().await?)
    } else {
        None
    };

    let mut tx = state.pool().begin().await?;

    let ids: Vec<ProductId> = input.items.iter().map(|l| l.product_id).collect();
    let products = ProductRepository::lock_for_update(&mut *tx, &ids).await?;

    let advance_booking = is_advance_booking(input.start_date, today);
    let mut items = Vec::with_capacity(input.items.len());
    let mut deposit_lines = Vec::with_capacity(input.items.len());
    let mut shipping_lines = Vec::with_capacity(input.items.len());
    let mut reserved = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for line in &input.items {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| AppError::NotFound(format!("product {}", line.product_id)))?;
        rentable(product)?;
        check_lead_time(
            product.stock_status,
            product.lead_time_days,
            input.start_date,
            today,
        )?;

        let price_per_unit = pricing::unit_price(&product.rates(), input.start_date, input.end_date)?;
        let total_price =
            pricing::line_total(&product.rates(), input.start_date, input.end_date, line.quantity)?;
        subtotal += total_price;

        if !advance_booking {
            let levels = product.stock_levels().reserve(line.quantity)?;
            reserved.push((product.id, levels));
        }

        items.push(NewOrderItem {
            product_id: product.id,
            quantity: line.quantity,
            start_date: input.start_date,
            end_date: input.end_date,
            price_per_unit,
            total_price,
            stock_reserved: !advance_booking,
        });
        deposit_lines.push(DepositLine::new(
            line.quantity,
            total_price,
            product.custom_deposit,
        ));
        shipping_lines.push(ShippingCostLine {
            shipping_cost: product.shipping_cost,
            installation_cost: product.installation_cost,
            quantity: line.quantity,
        });
    }

    let delivery_cost = match (&shipping_config, input.distance_km) {
        (Some(config), Some(distance_km)) => {
            quote_shipping(
                config,
                &ShippingRequest {
                    distance_km,
                    include_installation: input.include_installation,
                    products: shipping_lines,
                    urgent: input.urgent,
                    night: input.night,
                },
            )?
            .final_cost
        }
        _ => Decimal::ZERO,
    };

    let totals = order_totals(user.user_level, subtotal, delivery_cost);
    let deposit = calculate_deposit(user.user_level, &deposit_lines);

    let order = OrderRepository::insert(
        &mut *tx,
        today.year(),
        &NewOrder {
            user_id: user.id,
            start_date: input.start_date,
            end_date: input.end_date,
            delivery_type: input.delivery_type,
            delivery_address: input.delivery_address,
            distance_km: input.distance_km,
            subtotal: totals.subtotal,
            discount_amount: totals.discount,
            shipping_cost: totals.delivery_cost,
            tax_amount: totals.tax,
            total: totals.total,
            deposit_amount: deposit.amount,
            deposit_status: deposit.status,
            notes: input.notes,
        },
    )
    .await?;

    for item in &items {
        OrderRepository::insert_item(&mut *tx, order.id, item).await?;
    }
    for (product_id, levels) in &reserved {
        ProductRepository::set_stock_levels(&mut *tx, *product_id, levels).await?;
    }
    let items = OrderRepository::items_in(&mut *tx, order.id).await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        user_id = %order.user_id,
        user_level = %user.user_level,
        total = %order.total,
        deposit = %order.deposit_amount,
        advance_booking,
        "Order created"
    );

    Ok(OrderWithItems { order, items })
}

/// Give back the units an order reserved.
async fn release_stock(conn: &mut PgConnection, order_id: OrderId) -> Result<()> {
    let held: Vec<_> = OrderRepository::items_in(&mut *conn, order_id)
        .await?
        .into_iter()
        .filter(|i| i.stock_reserved)
        .filter_map(|i| i.product_id.map(|p| (p, i.quantity)))
        .collect();
    if held.is_empty() {
        return Ok(());
    }

    let mut ids: Vec<ProductId> = held.iter().map(|(p, _)| *p).collect();
    ids.sort_unstable();
    ids.dedup();
    let products = ProductRepository::lock_for_update(&mut *conn, &ids).await?;

    for product in &products {
        let quantity: i32 = held
            .iter()
            .filter(|(p, _)| *p == product.id)
            .map(|(_, q)| q)
            .sum();
        let levels = product.stock_levels().release(quantity);
        ProductRepository::set_stock_levels(&mut *conn, product.id, &levels).await?;
    }
    OrderRepository::clear_reservations(conn, order_id).await?;

    tracing::info!(order_id = %order_id, products = products.len(), "Stock released");
    Ok(())
}

/// Move an order to `to`, releasing its stock when it stops holding units.
///
/// # Errors
///
/// Returns `AppError::Order` when the transition table forbids the move.
pub async fn update_status(pool: &PgPool, order_id: OrderId, to: OrderStatus) -> Result<Order> {
    let mut tx = pool.begin().await?;
    let current = OrderRepository::lock(&mut *tx, order_id).await?;
    order::transition(current.status, to)?;

    if holds_reservation(current.status) && !holds_reservation(to) {
        release_stock(&mut *tx, order_id).await?;
    }
    let order = OrderRepository::update_status(
        &mut *tx,
        order_id,
        to,
        current.payment_status,
        None,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        from = %current.status,
        to = %to,
        "Order status changed"
    );
    Ok(order)
}

/// Midnight UTC of the first rental day.
fn event_start(start_date: NaiveDate) -> DateTime<Utc> {
    start_date.and_time(NaiveTime::MIN).and_utc()
}

fn cancellation_note(refund: &CancellationRefund, reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("Cancelled: {reason}. {}", refund.note),
        None => format!("Cancelled. {}", refund.note),
    }
}

/// Cancel an order, apply the refund policy and release its stock.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when `input.user_id` is not the owner and
/// `AppError::Order` when the order can no longer be cancelled.
pub async fn cancel_order(
    pool: &PgPool,
    order_id: OrderId,
    input: &CancelOrderInput,
    now: DateTime<Utc>,
) -> Result<CancellationOutcome> {
    let mut tx = pool.begin().await?;
    let current = OrderRepository::lock(&mut *tx, order_id).await?;

    if input.user_id.is_some_and(|u| u != current.user_id) {
        return Err(AppError::Forbidden(format!(
            "order {order_id} belongs to another customer"
        )));
    }
    order::transition(current.status, OrderStatus::Cancelled)?;

    let refund = cancellation_refund(current.advance_paid, event_start(current.start_date), now);
    let payment_status = if refund.refund_amount > Decimal::ZERO {
        PaymentStatus::Refunded
    } else {
        current.payment_status
    };
    let note = cancellation_note(&refund, input.reason.as_deref());

    if holds_reservation(current.status) {
        release_stock(&mut *tx, order_id).await?;
    }
    let order = OrderRepository::update_status(
        &mut *tx,
        order_id,
        OrderStatus::Cancelled,
        payment_status,
        Some(&note),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        full_refund = refund.full_refund,
        refund_amount = %refund.refund_amount,
        retained_amount = %refund.retained_amount,
        "Order cancelled"
    );
    Ok(CancellationOutcome { order, refund })
}

/// Amounts of the invoice for an order.
#[must_use]
pub fn invoice_for(order: &Order, issue_date: NaiveDate) -> NewInvoice {
    let due_date = issue_date
        .checked_add_signed(TimeDelta::days(INVOICE_DUE_DAYS))
        .unwrap_or(issue_date);
    NewInvoice {
        order_id: order.id,
        issue_date,
        due_date,
        subtotal: order.total - order.tax_amount,
        tax_amount: order.tax_amount,
        total: order.total,
    }
}

/// Issue the invoice for an order, or return the one already issued.
///
/// The flag is `true` when a new invoice was created.
///
/// # Errors
///
/// Returns `AppError::Conflict` for cancelled orders.
pub async fn generate_invoice(
    pool: &PgPool,
    order_id: OrderId,
    today: NaiveDate,
) -> Result<(Invoice, bool)> {
    let mut tx = pool.begin().await?;
    let order = OrderRepository::lock(&mut *tx, order_id).await?;

    if let Some(existing) = InvoiceRepository::find_by_order(&mut *tx, order_id).await? {
        return Ok((existing, false));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "order {} is cancelled",
            order.order_number
        )));
    }

    let invoice =
        InvoiceRepository::insert(&mut *tx, today.year(), &invoice_for(&order, today)).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order_id,
        invoice_number = %invoice.invoice_number,
        total = %invoice.total,
        "Invoice issued"
    );
    Ok((invoice, true))
}
