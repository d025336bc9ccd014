//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                              - Liveness
//! GET   /health/ready                        - Database readiness
//!
//! # Catalogue
//! GET   /api/v1/products                     - Active products (?category=slug)
//! GET   /api/v1/products/{id}                - Product detail
//! GET   /api/v1/products/{id}/availability   - Date-range availability
//! PATCH /api/v1/products/{id}/stock          - Stock adjustment (admin)
//! GET   /api/v1/categories                   - Visible categories
//! GET   /api/v1/packs                        - Active packs
//! GET   /api/v1/packs/{id}                   - Pack with items
//! GET   /api/v1/packs/{id}/pricing           - Recomputed price
//! POST  /api/v1/packs/{id}/recalculate       - Store recomputed price (admin)
//! GET   /api/v1/packs/{id}/availability      - Pack availability
//!
//! # Orders
//! POST  /api/v1/orders                       - Create order
//! GET   /api/v1/orders                       - A customer's orders (?user_id&page&limit)
//! GET   /api/v1/orders/{id}                  - Order with items
//! PATCH /api/v1/orders/{id}/status           - Status transition (admin)
//! POST  /api/v1/orders/{id}/cancel           - Cancel with refund policy
//! POST  /api/v1/orders/{id}/invoice          - Issue invoice (admin)
//! GET   /api/v1/invoices/{id}                - Invoice
//!
//! # Configuration and content
//! GET   /api/v1/shipping/config              - Shipping bands
//! PUT   /api/v1/shipping/config              - Replace shipping bands (admin)
//! POST  /api/v1/shipping/quote               - Shipping quote
//! GET   /api/v1/calculator/config            - Event calculator document
//! PUT   /api/v1/calculator/config            - Replace calculator document (admin)
//! GET   /api/v1/blog/posts                   - Published posts
//! GET   /api/v1/blog/posts/{slug}            - Published post
//! ```

pub mod blog;
pub mod calculator;
pub mod categories;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod packs;
pub mod products;
pub mod shipping;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/availability", get(products::availability))
        .route("/{id}/stock", patch(products::adjust_stock))
}

/// Create the pack routes router.
pub fn pack_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(packs::index))
        .route("/{id}", get(packs::show))
        .route("/{id}/pricing", get(packs::pricing))
        .route("/{id}/recalculate", post(packs::recalculate))
        .route("/{id}/availability", get(packs::availability))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/invoice", post(orders::invoice))
}

/// Create all `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(categories::index))
        .nest("/packs", pack_routes())
        .nest("/orders", order_routes())
        .route("/invoices/{id}", get(invoices::show))
        .route(
            "/shipping/config",
            get(shipping::config).put(shipping::update_config),
        )
        .route("/shipping/quote", post(shipping::quote))
        .route(
            "/calculator/config",
            get(calculator::config).put(calculator::update_config),
        )
        .route("/blog/posts", get(blog::index))
        .route("/blog/posts/{slug}", get(blog::show))
}

/// The full application: health checks, `/api/v1`, request IDs and tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        tracing::debug!("response");
                    },
                ),
        )
        .with_state(state)
}
