//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::{CatalogStore, InMemoryCatalogStore, Product};
use common::{Money, ProductId, Size};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::InMemoryOrderStore;
use tower::ServiceExt;
use uuid::Uuid;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> (axum::Router, InMemoryCatalogStore) {
    let catalog = InMemoryCatalogStore::new();
    catalog
        .insert_product(Product::new(
            "SKU-TEE",
            "Classic Tee",
            Money::from_cents(15000),
            [(Size::S, 1), (Size::M, 10)],
        ))
        .await
        .unwrap();

    let state = Arc::new(api::routes::orders::AppState::new(
        catalog.clone(),
        InMemoryOrderStore::new(),
    ));
    let app = api::create_app(state, get_metrics_handle());
    (app, catalog)
}

fn create_order_body(items: serde_json::Value, shipping_cost_cents: i64) -> Body {
    Body::from(
        serde_json::to_string(&serde_json::json!({
            "customer_id": Uuid::new_v4(),
            "items": items,
            "shipping_address": Uuid::new_v4(),
            "payment_method": Uuid::new_v4(),
            "shipping_cost_cents": shipping_cost_cents,
        }))
        .unwrap(),
    )
}

async fn post_order(app: &axum::Router, items: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(create_order_body(items, 5000))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_empty(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "api");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_create_and_get_product() {
    let (app, _) = setup().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "id": "SKU-HOODIE",
                        "name": "Hoodie",
                        "description": "A warm hoodie",
                        "price_cents": 4500,
                        "variants": { "M": 3, "L": 2 }
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let (status, product) = get_json(&app, "/products/SKU-HOODIE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["price_cents"], 4500);
    assert_eq!(product["variants"]["M"], 3);
    assert_eq!(product["total_stock"], 5);
}

#[tokio::test]
async fn test_create_product_rejects_bad_input() {
    let (app, _) = setup().await;

    // Non-positive price.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "id": "SKU-FREE",
                        "name": "Freebie",
                        "price_cents": 0,
                        "variants": { "M": 1 }
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Duplicate SKU.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "id": "SKU-TEE",
                        "name": "Another Tee",
                        "price_cents": 100,
                        "variants": { "M": 1 }
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_order_reprices_from_catalog() {
    let (app, _) = setup().await;

    let (status, order) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "M", "quantity": 2 }]),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    // 2 × $150.00 catalog price + $50.00 shipping.
    assert_eq!(order["total_cents"], 35000);
    assert_eq!(order["items"][0]["unit_price_cents"], 15000);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
}

#[tokio::test]
async fn test_insufficient_stock_returns_conflict_with_items() {
    let (app, catalog) = setup().await;

    let (status, body) = post_order(
        &app,
        serde_json::json!([
            { "product_id": "SKU-TEE", "size": "M", "quantity": 2 },
            { "product_id": "SKU-TEE", "size": "S", "quantity": 3 }
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["size"], "S");
    assert_eq!(items[0]["requested"], 3);
    assert_eq!(items[0]["available"], 1);

    // The first line's decrement was rolled back.
    let product = catalog
        .get_product(&ProductId::new("SKU-TEE"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock_for(Size::M), Some(10));
}

#[tokio::test]
async fn test_two_buyers_race_for_the_last_unit() {
    let (app, _) = setup().await;

    // Only one size-S tee in stock; the second buyer must see the loss
    // reported with the observed availability.
    let (status, _) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "S", "quantity": 1 }]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "S", "quantity": 1 }]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["items"][0]["requested"], 1);
    assert_eq!(body["items"][0]["available"], 0);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let (app, _) = setup().await;
    let fake_id = Uuid::new_v4();

    let (status, _) = get_json(&app, &format!("/orders/{fake_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let (app, _) = setup().await;

    let (status, _) = get_json(&app, "/orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_restores_stock() {
    let (app, catalog) = setup().await;

    let (_, order) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "M", "quantity": 4 }]),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let product = catalog
        .get_product(&ProductId::new("SKU-TEE"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock_for(Size::M), Some(6));

    let (status, cancelled) = post_empty(&app, &format!("/orders/{order_id}/cancel")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let product = catalog
        .get_product(&ProductId::new("SKU-TEE"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock_for(Size::M), Some(10));

    // A second cancel conflicts.
    let (status, _) = post_empty(&app, &format!("/orders/{order_id}/cancel")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pay_then_cancel_refunds() {
    let (app, _) = setup().await;

    let (_, order) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "M", "quantity": 1 }]),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, paid) = post_empty(&app, &format!("/orders/{order_id}/pay")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["payment_status"], "paid");

    let (status, cancelled) = post_empty(&app, &format!("/orders/{order_id}/cancel")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["payment_status"], "refunded");
}

#[tokio::test]
async fn test_status_transitions_via_put() {
    let (app, _) = setup().await;

    let (_, order) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "M", "quantity": 1 }]),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    // Pending cannot jump straight to delivered.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/orders/{order_id}/status"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"status":"delivered"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Cancellation must use the cancel endpoint.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/orders/{order_id}/status"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"status":"cancelled"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/orders/{order_id}/status"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"status":"shipped"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_requires_cancellation() {
    let (app, _) = setup().await;

    let (_, order) = post_order(
        &app,
        serde_json::json!([{ "product_id": "SKU-TEE", "size": "M", "quantity": 1 }]),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    post_empty(&app, &format!("/orders/{order_id}/cancel")).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = get_json(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_with_filters() {
    let (app, _) = setup().await;
    let customer_id = Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "customer_id": customer_id,
                        "items": [{ "product_id": "SKU-TEE", "size": "M", "quantity": 1 }],
                        "shipping_address": Uuid::new_v4(),
                        "payment_method": Uuid::new_v4(),
                        "shipping_cost_cents": 0,
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let (status, list) = get_json(&app, &format!("/orders?customer_id={customer_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, list) = get_json(
        &app,
        &format!("/orders?customer_id={customer_id}&status=cancelled"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = get_json(&app, "/orders?status=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}
