//! Order route handlers.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;

use resona_core::{OrderId, UserId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::RequireAdmin;
use crate::models::{
    CancelOrderInput, CreateOrderInput, Invoice, Order, OrderPage, OrderWithItems, Pagination,
    UpdateStatusInput,
};
use crate::services::orders::{self, CancellationOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub user_id: UserId,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderListQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Create an order.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let order = orders::create_order(&state, input, Utc::now().date_naive()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// A page of a customer's orders.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OrderListQuery>,
) -> Result<Json<OrderPage>> {
    let pagination = query.pagination();
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_user(query.user_id, pagination)
        .await?;
    Ok(Json(OrderPage {
        orders,
        page: pagination.page(),
        limit: pagination.limit(),
        total,
        total_pages: pagination.total_pages(total),
    }))
}

/// Order with its lines.
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let items = repo.items(id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

/// Move an order to another status.
pub async fn update_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    PathParam(id): PathParam<OrderId>,
    JsonBody(input): JsonBody<UpdateStatusInput>,
) -> Result<Json<Order>> {
    Ok(Json(
        orders::update_status(state.pool(), id, input.status).await?,
    ))
}

/// Cancel an order. The body is optional.
pub async fn cancel(
    State(state): State<AppState>,
    PathParam(id): PathParam<OrderId>,
    body: Bytes,
) -> Result<Json<CancellationOutcome>> {
    let input: CancelOrderInput = if body.iter().all(u8::is_ascii_whitespace) {
        CancelOrderInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };
    Ok(Json(
        orders::cancel_order(state.pool(), id, &input, Utc::now()).await?,
    ))
}

/// Issue the order's invoice. Returns 201 when created, 200 when it existed.
pub async fn invoice(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    PathParam(id): PathParam<OrderId>,
) -> Result<(StatusCode, Json<Invoice>)> {
    let (invoice, created) =
        orders::generate_invoice(state.pool(), id, Utc::now().date_naive()).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(invoice)))
}
