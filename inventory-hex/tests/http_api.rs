//! HTTP-level tests of the inventory API over an in-memory SQLite store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use inventory_hex::{InventoryService, RateService, inbound::HttpServer};
use inventory_repo::SqliteRepo;
use inventory_types::{ExternalRateSource, Rate, RateError, RateSource};

/// Rate source answering whatever the test last set; `None` is an outage.
struct StubSource(Arc<Mutex<Option<f64>>>);

#[async_trait]
impl ExternalRateSource for StubSource {
    async fn fetch_rate(&self) -> Result<Rate, RateError> {
        match *self.0.lock().unwrap() {
            Some(value) => Ok(Rate::new(value)?),
            None => Err(RateError::Network("unreachable".into())),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

async fn create_app(source_rate: Option<f64>) -> Router {
    let repo = Arc::new(SqliteRepo::new("sqlite::memory:").await.unwrap());
    let rates = Arc::new(RateService::new(
        StubSource(Arc::new(Mutex::new(source_rate))),
        repo.clone(),
        Rate::new(36.5).unwrap(),
    ));
    let inventory = InventoryService::new(repo, rates.subscribe());
    HttpServer::new(rates, inventory).router()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_product(app: &Router, name: &str, price_usd: i64, stock: i32) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/products",
        Some(json!({
            "name": name,
            "price_usd": price_usd,
            "cost_usd": price_usd / 2,
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn set_rate(app: &Router, rate: f64) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/rates/manual",
        Some(json!({ "rate": rate })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = create_app(None).await;
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_manual_rate_validation() {
    let app = create_app(None).await;

    let (_, current) = call(&app, Method::GET, "/api/rates/current", None).await;
    assert_eq!(current["rate"], 36.5);

    for bad in [0.0, -5.0] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/rates/manual",
            Some(json!({ "rate": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    set_rate(&app, 40.0).await;
    let (_, current) = call(&app, Method::GET, "/api/rates/current", None).await;
    assert_eq!(current["rate"], 40.0);
    assert_eq!(current["source"], "manual");
}

#[tokio::test]
async fn test_refresh_records_history() {
    let app = create_app(Some(41.0)).await;

    let (status, current) = call(&app, Method::POST, "/api/rates/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["rate"], 41.0);
    assert_eq!(current["source"], "api");

    let (_, history) = call(&app, Method::GET, "/api/rates/history?limit=5", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["source"], "api");
    assert_eq!(history[0]["active"], true);
}

#[tokio::test]
async fn test_refresh_falls_back_to_stored_rate() {
    let app = create_app(None).await;
    set_rate(&app, 37.25).await;

    let (status, current) = call(&app, Method::POST, "/api/rates/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["rate"], 37.25);
    assert_eq!(current["source"], "fallback");
}

#[tokio::test]
async fn test_convert() {
    let app = create_app(None).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/rates/convert",
        Some(json!({ "amount": 36500, "from": "VES", "to": "USD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted"], 1000);
}

#[tokio::test]
async fn test_product_prices_follow_rate_but_sales_are_frozen() {
    let app = create_app(None).await;
    let product_id = create_product(&app, "Harina PAN", 1000, 10).await;

    let (status, sale) = call(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({ "lines": [{ "product_id": product_id, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", sale);
    assert_eq!(sale["total_local"], 36500);
    let sale_id = sale["id"].as_str().unwrap().to_string();

    set_rate(&app, 40.0).await;

    let (_, product) = call(&app, Method::GET, &format!("/api/products/{}", product_id), None).await;
    assert_eq!(product["price_local"], 40000);
    assert_eq!(product["stock"], 9);

    let (_, sale) = call(&app, Method::GET, &format!("/api/sales/{}", sale_id), None).await;
    assert_eq!(sale["total_local"], 36500);
    assert_eq!(sale["rate"], 36.5);
}

#[tokio::test]
async fn test_sale_beyond_stock_is_conflict() {
    let app = create_app(None).await;
    let product_id = create_product(&app, "Café", 800, 1).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({ "lines": [{ "product_id": product_id, "quantity": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn test_bad_and_unknown_ids() {
    let app = create_app(None).await;

    let (status, _) = call(&app, Method::GET, "/api/products/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/products/7f1c9a52-2d1e-4c59-9a43-3f8c5b0e6a11",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_reception_adds_stock() {
    let app = create_app(None).await;
    let product_id = create_product(&app, "Aceite", 600, 0).await;

    let (status, supplier) = call(
        &app,
        Method::POST,
        "/api/suppliers",
        Some(json!({ "name": "Distribuidora Caracas" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, order) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({
            "supplier_id": supplier["id"],
            "lines": [{ "product_id": product_id, "quantity": 12 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["rate_frozen"], false);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, order) = call(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", order_id),
        Some(json!({ "status": "received" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["rate_frozen"], true);

    let (_, product) = call(&app, Method::GET, &format!("/api/products/{}", product_id), None).await;
    assert_eq!(product["stock"], 12);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", order_id),
        Some(json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_export_is_csv() {
    let app = create_app(None).await;
    create_product(&app, "Arroz", 120, 30).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("ID,Name,"));
    assert!(text.contains("Arroz"));
}

#[tokio::test]
async fn test_summary_and_openapi() {
    let app = create_app(None).await;
    create_product(&app, "Leche", 250, 2).await;

    let (status, summary) = call(&app, Method::GET, "/api/reports/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["active_products"], 1);
    assert_eq!(summary["low_stock_products"], 1);

    let (status, doc) = call(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/rates/current"].is_object());
}

#[tokio::test]
async fn test_customer_crud_and_sale_link() {
    let app = create_app(None).await;
    let product_id = create_product(&app, "Pan Canilla", 80, 20).await;

    let (status, customer) = call(
        &app,
        Method::POST,
        "/api/customers",
        Some(json!({ "name": "María Pérez", "document_id": "V-12345678" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", customer);
    let customer_id = customer["id"].as_str().unwrap().to_string();
    let uri = format!("/api/customers/{}", customer_id);

    let (status, updated) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "phone": "0414-5550000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "0414-5550000");
    assert_eq!(updated["document_id"], "V-12345678");

    let (status, sale) = call(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "lines": [{ "product_id": product_id, "quantity": 2 }],
            "customer_id": customer_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", sale);
    assert_eq!(sale["customer_id"], customer["id"]);
    assert_eq!(sale["customer"], "María Pérez");

    let (status, deactivated) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["active"], false);

    let (_, listed) = call(&app, Method::GET, "/api/customers", None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_category_delete_and_supplier_deactivate() {
    let app = create_app(None).await;

    let (_, category) = call(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({ "name": "Charcutería" })),
    )
    .await;
    let (status, product) = call(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({
            "name": "Queso blanco",
            "price_usd": 450,
            "category_id": category["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", product);

    let category_uri = format!("/api/categories/{}", category["id"].as_str().unwrap());
    let (status, renamed) = call(
        &app,
        Method::PATCH,
        &category_uri,
        Some(json!({ "name": "Charcutería y quesos" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Charcutería y quesos");

    let (status, _) = call(&app, Method::DELETE, &category_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &category_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let product_uri = format!("/api/products/{}", product["id"].as_str().unwrap());
    let (_, product) = call(&app, Method::GET, &product_uri, None).await;
    assert!(product["category_id"].is_null());

    let (_, supplier) = call(
        &app,
        Method::POST,
        "/api/suppliers",
        Some(json!({ "name": "Lácteos Los Andes" })),
    )
    .await;
    let supplier_uri = format!("/api/suppliers/{}", supplier["id"].as_str().unwrap());
    let (status, supplier) = call(&app, Method::DELETE, &supplier_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supplier["active"], false);

    let (_, listed) = call(&app, Method::GET, "/api/suppliers", None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({
            "supplier_id": supplier["id"],
            "lines": [{ "product_id": product["id"], "quantity": 5 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_movements_ledger() {
    let app = create_app(None).await;
    let product_id = create_product(&app, "Mortadela", 300, 10).await;

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/products/{}/stock", product_id),
        Some(json!({ "delta": 5, "reason": "reposición" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({ "lines": [{ "product_id": product_id, "quantity": 4 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, ledger) = call(
        &app,
        Method::GET,
        &format!("/api/stock-movements?product_id={}", product_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", ledger);
    let ledger = ledger.as_array().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0]["kind"], "sale");
    assert_eq!(ledger[0]["quantity"], -4);
    assert_eq!(ledger[1]["kind"], "adjustment");
    assert_eq!(ledger[1]["notes"], "Manual stock adjustment: +5 (reposición)");

    let (status, _) = call(&app, Method::GET, "/api/stock-movements?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_outage_after_fetch_keeps_stored_api_rate() {
    let answer = Arc::new(Mutex::new(Some(41.0)));
    let repo = Arc::new(SqliteRepo::new("sqlite::memory:").await.unwrap());
    let rates = RateService::new(
        StubSource(answer.clone()),
        repo,
        Rate::new(36.5).unwrap(),
    );
    rates.refresh().await;

    *answer.lock().unwrap() = None;
    let mut rx = rates.subscribe();
    rx.borrow_and_update();

    let current = rates.refresh().await;
    assert_eq!(current.rate.value(), 41.0);
    assert_eq!(current.source, RateSource::Api);
    assert!(!rx.has_changed().unwrap());
}
