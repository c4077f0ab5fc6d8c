use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use rust_decimal::Decimal;
use serde_json::json;
use storefront_domain::model::{NewProduct, ProductRecord};
use storefront_domain::services::{
    cache::ProductCache,
    telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard},
};
use storefront_domain::storage::StorageError;
use storefront_domain::CatalogStore;
use storefront_storage::SeaOrmStorage;

use crate::application::public_routes;

use crate::handlers::{
    configure_metrics, configure_public,
    health::{HealthResponse, MessageResponse},
    items::ProductResponse,
    orders::{
        OrderCreatedResponse, OrderDeletedResponse, OrderDetailResponse, OrderResponse,
        OrderUpdatedResponse,
    },
    reports::{BestSellerResponse, RevenueResponse},
    track, ApiError, Endpoint, ErrorBody,
};
use crate::state::AppState;

async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:")
        .await
        .expect("storage inits")
}

fn telemetry() -> TelemetryGuard {
    let config = TelemetryConfig::from_env("API_TEST");
    init_telemetry(&config).expect("telemetry inits")
}

fn build_state(storage: SeaOrmStorage) -> AppState {
    AppState::new(storage, Arc::new(ProductCache::default()), telemetry())
}

async fn insert_product(storage: &SeaOrmStorage, name: &str, cents: i64) -> ProductRecord {
    storage
        .insert_product(NewProduct {
            name: name.into(),
            price: Decimal::new(cents, 2),
            description: Some(format!("{name} description")),
            is_sale: false,
            sale_price: None,
        })
        .await
        .expect("product inserts")
}

fn order_body(lines: serde_json::Value) -> serde_json::Value {
    json!({
        "user_id": 3,
        "full_name": "Alan Turing",
        "email": "alan@example.com",
        "shipping_address": "Bletchley Park",
        "amount_paid": 42.5,
        "items": lines,
    })
}

#[actix_web::test]
async fn health_and_root_respond() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage().await)))
            .configure(configure_public),
    )
    .await;

    let health: HealthResponse =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(health.status, "ok");

    let root: MessageResponse =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(root.message, "Hello World");
}

#[actix_web::test]
async fn lists_items() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    insert_product(&storage, "Tee", 1999).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;

    let items: Vec<ProductResponse> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/items").to_request())
            .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], ProductResponse::from(mug));
    assert_eq!(items[1].name, "Tee");
}

#[actix_web::test]
async fn missing_item_returns_not_found_detail() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage().await)))
            .configure(configure_public),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/items/99").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.detail, "Item not found");
}

#[actix_web::test]
async fn non_numeric_item_id_is_unprocessable() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage().await)))
            .configure(configure_public),
    )
    .await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/items/abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn item_lookup_is_served_from_cache() {
    let storage = storage().await;
    let state = build_state(storage.clone());
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_public),
    )
    .await;

    let first: ProductResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/items/{}", mug.id))
            .to_request(),
    )
    .await;
    assert_eq!(first.name, "Mug");

    let mut renamed = mug.clone();
    renamed.name = "Cached Mug".into();
    state.product_cache().insert(renamed);

    let second: ProductResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/items/{}", mug.id))
            .to_request(),
    )
    .await;
    assert_eq!(second.name, "Cached Mug");
}

#[actix_web::test]
async fn orders_feed_sales_and_reports() {
    let storage = storage().await;
    let sticker = insert_product(&storage, "Sticker", 150).await;
    let jacket = insert_product(&storage, "Jacket", 8000).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;

    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": sticker.id, "quantity": 4, "price": 1.5},
                {"product_id": jacket.id, "quantity": 1, "price": "80.00"},
            ])))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::OK);
    let created: OrderCreatedResponse = test::read_body_json(created).await;
    assert_eq!(created.message, "Order created");

    let sales: Vec<OrderResponse> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/sales").to_request())
            .await;
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id, created.order_id);
    assert_eq!(sales[0].amount_paid, Decimal::new(4250, 2));
    assert!(!sales[0].shipped);

    let revenue: Vec<RevenueResponse> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/ecom/totalrevenue")
            .to_request(),
    )
    .await;
    assert_eq!(
        revenue,
        vec![
            RevenueResponse {
                total_revenue: Decimal::new(600, 2),
                product_id: sticker.id,
                product_name: "Sticker".into(),
            },
            RevenueResponse {
                total_revenue: Decimal::new(8000, 2),
                product_id: jacket.id,
                product_name: "Jacket".into(),
            },
        ]
    );

    let best: BestSellerResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/ecom/highest_selling")
            .to_request(),
    )
    .await;
    assert_eq!(best.product_id, sticker.id);
    assert_eq!(best.total_quantity, 4);
    assert_eq!(best.total_revenue, Decimal::new(600, 2));
}

#[actix_web::test]
async fn revenue_is_emitted_as_json_number() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;
    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": mug.id, "quantity": 2, "price": 8.99},
            ])))
            .to_request(),
    )
    .await;

    let raw: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/ecom/totalrevenue")
            .to_request(),
    )
    .await;
    assert_eq!(raw[0]["total_revenue"], json!(17.98));
    assert_eq!(raw[0]["product_name"], json!("Mug"));
}

#[actix_web::test]
async fn highest_selling_without_sales_is_not_found() {
    let storage = storage().await;
    insert_product(&storage, "Unsold", 100).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/ecom/highest_selling")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.detail, "No sales data available");
}

#[actix_web::test]
async fn invalid_orders_are_rejected() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;

    let unknown_product = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": 4242, "quantity": 1, "price": 1},
            ])))
            .to_request(),
    )
    .await;
    assert_eq!(unknown_product.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let zero_quantity = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": mug.id, "quantity": 0, "price": 1},
            ])))
            .to_request(),
    )
    .await;
    assert_eq!(zero_quantity.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let missing_field = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({"full_name": "No Email", "amount_paid": 1}))
            .to_request(),
    )
    .await;
    assert_eq!(missing_field.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let sales: Vec<OrderResponse> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/sales").to_request())
            .await;
    assert!(sales.is_empty());
}

#[actix_web::test]
async fn order_detail_includes_line_items() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;
    let created: OrderCreatedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": mug.id, "quantity": 3, "price": 8.99},
            ])))
            .to_request(),
    )
    .await;

    let detail: OrderDetailResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/orders/{}", created.order_id))
            .to_request(),
    )
    .await;
    assert_eq!(detail.order.full_name, "Alan Turing");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 3);
    assert_eq!(detail.items[0].user_id, Some(3));

    let missing =
        test::call_service(&app, test::TestRequest::get().uri("/orders/999").to_request()).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn updating_order_ships_and_adjusts_lines() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;
    let created: OrderCreatedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": mug.id, "quantity": 1, "price": 8.99},
            ])))
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}", created.order_id))
            .set_json(json!({
                "shipped": true,
                "items": [{"product_id": mug.id, "quantity": 5, "price": "7.50"}],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: OrderUpdatedResponse = test::read_body_json(resp).await;
    assert_eq!(updated.message, "Order updated");
    assert!(updated.order.shipped);
    assert!(updated.order.date_shipped.is_some());

    let revenue: Vec<RevenueResponse> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/ecom/totalrevenue")
            .to_request(),
    )
    .await;
    assert_eq!(revenue[0].total_revenue, Decimal::new(3750, 2));

    let missing = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/orders/999")
            .set_json(json!({"shipped": true}))
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = test::read_body_json(missing).await;
    assert_eq!(body.detail, "Order not found");
}

#[actix_web::test]
async fn explicit_ship_date_is_kept() {
    let storage = storage().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;
    let created: OrderCreatedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([])))
            .to_request(),
    )
    .await;

    let updated: OrderUpdatedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/orders/{}", created.order_id))
            .set_json(json!({"shipped": true, "date_shipped": "2024-03-01T10:00:00Z"}))
            .to_request(),
    )
    .await;
    assert_eq!(
        updated.order.date_shipped.map(|d| d.to_rfc3339()),
        Some("2024-03-01T10:00:00+00:00".to_string())
    );
}

#[actix_web::test]
async fn deleting_order_removes_it() {
    let storage = storage().await;
    let mug = insert_product(&storage, "Mug", 899).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;
    let created: OrderCreatedResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": mug.id, "quantity": 1, "price": 8.99},
            ])))
            .to_request(),
    )
    .await;
    let uri = format!("/orders/{}", created.order_id);

    let deleted: OrderDeletedResponse =
        test::call_and_read_body_json(&app, test::TestRequest::delete().uri(&uri).to_request())
            .await;
    assert_eq!(deleted.message, "Order deleted successfully");

    let again = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let revenue: Vec<RevenueResponse> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/ecom/totalrevenue")
            .to_request(),
    )
    .await;
    assert!(revenue.is_empty());
}

#[actix_web::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage().await)))
            .configure(configure_public)
            .configure(configure_metrics),
    )
    .await;
    test::call_service(&app, test::TestRequest::get().uri("/items").to_request()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/plain"));
}

#[actix_web::test]
async fn metrics_stay_off_public_app_when_internal_listener_is_set() {
    let state = build_state(storage().await);
    let internal_only = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(public_routes(false)),
    )
    .await;
    let resp = test::call_service(
        &internal_only,
        test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let health = test::call_service(
        &internal_only,
        test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(health.status(), StatusCode::OK);

    let public_metrics = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(public_routes(true)),
    )
    .await;
    let resp = test::call_service(
        &public_metrics,
        test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn storage_failures_are_counted() {
    let guard = telemetry();
    let result = track(
        Endpoint::DeleteOrder,
        Err::<bool, _>(StorageError::Database("disk I/O error".into())),
    );
    assert!(matches!(result, Err(ApiError::Storage(_))));

    let rejected = track(
        Endpoint::CreateOrder,
        Err::<i32, _>(StorageError::UnknownProduct(9)),
    );
    assert!(matches!(rejected, Err(ApiError::Unprocessable(_))));

    let rendered = guard.render_metrics();
    let counted = |endpoint: &str, status: &str| {
        rendered.lines().any(|line| {
            line.starts_with("api_requests_total")
                && line.contains(&format!(r#"endpoint="{endpoint}""#))
                && line.contains(&format!(r#"status="{status}""#))
        })
    };
    assert!(counted("delete_order", "failed"));
    assert!(counted("create_order", "rejected"));
}

#[actix_web::test]
async fn oversized_line_total_is_unprocessable() {
    let storage = storage().await;
    let yacht = insert_product(&storage, "Yacht", 100).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state(storage)))
            .configure(configure_public),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders")
            .set_json(order_body(json!([
                {"product_id": yacht.id, "quantity": 1_000_000, "price": "100000000000000"},
            ])))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert!(body.detail.starts_with("invalid amount"));

    let sales: Vec<OrderResponse> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/sales").to_request())
            .await;
    assert!(sales.is_empty());
}
