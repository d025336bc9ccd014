//! Routing, authentication and validation through the full router.
//!
//! Every request here is answered before the handler needs the database, so
//! these tests run without `PostgreSQL`.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use resona_integration_tests::{ADMIN_TOKEN, get, json, offline_app, send};
use serde_json::json;
use tower::ServiceExt;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let (status, _) = send(&offline_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let (status, _) = send(&offline_app(), get("/health/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let response = offline_app().oneshot(get("/health")).await.unwrap();
    let id = response.headers().get("x-request-id").unwrap();
    assert!(!id.is_empty());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let request = Request::get("/health")
        .header("x-request-id", "upstream-123")
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "upstream-123"
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(&offline_app(), get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Admin authentication
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = offline_app();
    let cases = [
        ("PATCH", "/api/v1/products/1/stock"),
        ("POST", "/api/v1/packs/1/recalculate"),
        ("PATCH", "/api/v1/orders/1/status"),
        ("POST", "/api/v1/orders/1/invoice"),
        ("PUT", "/api/v1/shipping/config"),
        ("PUT", "/api/v1/calculator/config"),
    ];
    for (method, uri) in cases {
        let (status, body) = send(&app, json(method, uri, &json!({}), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }
}

#[tokio::test]
async fn test_admin_endpoints_reject_wrong_token() {
    let (status, body) = send(
        &offline_app(),
        json(
            "PATCH",
            "/api/v1/products/1/stock",
            &json!({}),
            Some("wrong-token-wrong-token-wrong-token"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("invalid"));
}

#[tokio::test]
async fn test_admin_token_passes_to_body_validation() {
    let (status, body) = send(
        &offline_app(),
        json(
            "PATCH",
            "/api/v1/products/1/stock",
            &json!({ "quantity": "many" }),
            Some(ADMIN_TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ============================================================================
// Request validation
// ============================================================================

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (status, body) = send(&offline_app(), get("/api/v1/products/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_availability_requires_dates() {
    let (status, _) = send(
        &offline_app(),
        get("/api/v1/products/1/availability?start=tomorrow&end=2030-01-02"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::post("/api/v1/shipping/quote")
        .header("content-type", "application/json")
        .body(Body::from("{\"distance_km\":"))
        .unwrap();
    let (status, body) = send(&offline_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

fn order_body(start_offset: i64, end_offset: i64, items: &serde_json::Value) -> serde_json::Value {
    let today = Utc::now().date_naive();
    json!({
        "user_id": 1,
        "start_date": (today + Duration::days(start_offset)).to_string(),
        "end_date": (today + Duration::days(end_offset)).to_string(),
        "items": items,
    })
}

#[tokio::test]
async fn test_order_without_items_is_rejected() {
    let body = order_body(5, 6, &json!([]));
    let (status, response) = send(&offline_app(), json("POST", "/api/v1/orders", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("no items"));
}

#[tokio::test]
async fn test_order_with_reversed_dates_is_rejected() {
    let body = order_body(6, 5, &json!([{ "product_id": 1, "quantity": 1 }]));
    let (status, _) = send(&offline_app(), json("POST", "/api/v1/orders", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_in_the_past_is_rejected() {
    let body = order_body(-3, -1, &json!([{ "product_id": 1, "quantity": 1 }]));
    let (status, response) = send(&offline_app(), json("POST", "/api/v1/orders", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("past"));
}

#[tokio::test]
async fn test_order_with_duplicate_products_is_rejected() {
    let items = json!([
        { "product_id": 7, "quantity": 1 },
        { "product_id": 7, "quantity": 2 },
    ]);
    let body = order_body(5, 6, &items);
    let (status, response) = send(&offline_app(), json("POST", "/api/v1/orders", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("more than once"));
}

#[tokio::test]
async fn test_delivery_order_needs_distance() {
    let mut body = order_body(5, 6, &json!([{ "product_id": 1, "quantity": 1 }]));
    body["delivery_type"] = json!("DELIVERY");
    body["delivery_address"] = json!("Calle Mayor 1");
    let (status, response) = send(&offline_app(), json("POST", "/api/v1/orders", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("distance_km"));
}

#[tokio::test]
async fn test_cancel_with_malformed_body_is_rejected() {
    let request = Request::post("/api/v1/orders/1/cancel")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = send(&offline_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
