//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use inventory_types::{
    AppError, CategoryId, ConvertRequest, CreateCategoryRequest, CreateCustomerRequest,
    CreateOrderRequest, CreateProductRequest, CreateSaleRequest, CreateSupplierRequest,
    CustomerId, ExternalRateSource, HistoryQuery, InventoryRepository, MovementQuery, OrderId,
    ProductFilter, ProductId, QuoteRequest, RateHistoryRepository, SaleId, SetRateRequest,
    StockAdjustmentRequest, SupplierId, UpdateCategoryRequest, UpdateCustomerRequest,
    UpdateOrderStatusRequest, UpdateProductRequest, UpdateSupplierRequest,
};

use crate::openapi::ApiDoc;
use crate::{InventoryService, RateService};

/// Default number of history records returned.
const DEFAULT_HISTORY_LIMIT: i64 = 30;

/// Application state shared across handlers.
pub struct AppState<S, R>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    pub rates: Arc<RateService<S, R>>,
    pub inventory: InventoryService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(AppError::BadRequest(format!("Invalid {} ID", what))))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange rate
// ─────────────────────────────────────────────────────────────────────────────

pub async fn current_rate<S, R>(State(state): State<Arc<AppState<S, R>>>) -> impl IntoResponse
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Json(state.rates.current_rate())
}

#[tracing::instrument(skip(state))]
pub async fn refresh_rate<S, R>(State(state): State<Arc<AppState<S, R>>>) -> impl IntoResponse
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Json(state.rates.refresh().await)
}

#[tracing::instrument(skip(state), fields(rate = req.rate))]
pub async fn set_manual_rate<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<SetRateRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let current = state
        .rates
        .set_manual_rate(req.rate)
        .await
        .map_err(AppError::from)?;
    Ok(Json(current))
}

#[tracing::instrument(skip(state))]
pub async fn rate_history<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let records = state
        .rates
        .history(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    Ok(Json(records))
}

pub async fn convert<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<ConvertRequest>,
) -> impl IntoResponse
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Json(state.rates.convert(&req))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state), fields(name = %req.name))]
pub async fn create_category<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let category = state.inventory.create_category(req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_categories().await?))
}

#[tracing::instrument(skip(state, req), fields(category_id = %id))]
pub async fn update_category<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let category_id: CategoryId = parse_id(&id, "category")?;
    Ok(Json(state.inventory.update_category(category_id, req).await?))
}

#[tracing::instrument(skip(state), fields(category_id = %id))]
pub async fn delete_category<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let category_id: CategoryId = parse_id(&id, "category")?;
    state.inventory.delete_category(category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state), fields(name = %req.name))]
pub async fn create_supplier<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let supplier = state.inventory.create_supplier(req).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn list_suppliers<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_suppliers().await?))
}

#[tracing::instrument(skip(state), fields(supplier_id = %id))]
pub async fn get_supplier<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let supplier_id: SupplierId = parse_id(&id, "supplier")?;
    Ok(Json(state.inventory.get_supplier(supplier_id).await?))
}

#[tracing::instrument(skip(state, req), fields(supplier_id = %id))]
pub async fn update_supplier<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let supplier_id: SupplierId = parse_id(&id, "supplier")?;
    Ok(Json(state.inventory.update_supplier(supplier_id, req).await?))
}

#[tracing::instrument(skip(state), fields(supplier_id = %id))]
pub async fn deactivate_supplier<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let supplier_id: SupplierId = parse_id(&id, "supplier")?;
    Ok(Json(state.inventory.deactivate_supplier(supplier_id).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create_customer<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let customer = state.inventory.create_customer(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_customers().await?))
}

#[tracing::instrument(skip(state), fields(customer_id = %id))]
pub async fn get_customer<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let customer_id: CustomerId = parse_id(&id, "customer")?;
    Ok(Json(state.inventory.get_customer(customer_id).await?))
}

#[tracing::instrument(skip(state, req), fields(customer_id = %id))]
pub async fn update_customer<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let customer_id: CustomerId = parse_id(&id, "customer")?;
    Ok(Json(state.inventory.update_customer(customer_id, req).await?))
}

#[tracing::instrument(skip(state), fields(customer_id = %id))]
pub async fn deactivate_customer<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let customer_id: CustomerId = parse_id(&id, "customer")?;
    Ok(Json(state.inventory.deactivate_customer(customer_id).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create_product<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let product = state.inventory.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state))]
pub async fn list_products<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_products(&filter).await?))
}

pub async fn low_stock_products<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.low_stock_products().await?))
}

#[tracing::instrument(skip(state))]
pub async fn export_products<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let csv = state.inventory.export_products_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"",
            ),
        ],
        csv,
    ))
}

#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn get_product<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let product_id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.inventory.get_product(product_id).await?))
}

#[tracing::instrument(skip(state, req), fields(product_id = %id))]
pub async fn update_product<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let product_id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.inventory.update_product(product_id, req).await?))
}

#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn deactivate_product<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let product_id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.inventory.deactivate_product(product_id).await?))
}

#[tracing::instrument(skip(state), fields(product_id = %id, delta = req.delta))]
pub async fn adjust_stock<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let product_id: ProductId = parse_id(&id, "product")?;
    Ok(Json(state.inventory.adjust_stock(product_id, req).await?))
}

#[tracing::instrument(skip(state))]
pub async fn list_stock_movements<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Query(query): Query<MovementQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_stock_movements(&query).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Sales
// ─────────────────────────────────────────────────────────────────────────────

pub async fn quote_sale<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.quote_sale(req).await?))
}

#[tracing::instrument(skip(state, req), fields(lines = req.lines.len()))]
pub async fn create_sale<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let sale = state.inventory.create_sale(req).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list_sales<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_sales().await?))
}

#[tracing::instrument(skip(state), fields(sale_id = %id))]
pub async fn get_sale<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let sale_id: SaleId = parse_id(&id, "sale")?;
    Ok(Json(state.inventory.get_sale(sale_id).await?))
}

#[tracing::instrument(skip(state), fields(sale_id = %id))]
pub async fn cancel_sale<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let sale_id: SaleId = parse_id(&id, "sale")?;
    Ok(Json(state.inventory.cancel_sale(sale_id).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Purchase orders
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(supplier_id = %req.supplier_id))]
pub async fn create_order<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let order = state.inventory.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.list_orders().await?))
}

#[tracing::instrument(skip(state), fields(order_id = %id))]
pub async fn get_order<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let order_id: OrderId = parse_id(&id, "order")?;
    Ok(Json(state.inventory.get_order(order_id).await?))
}

#[tracing::instrument(skip(state), fields(order_id = %id, status = %req.status))]
pub async fn update_order_status<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    let order_id: OrderId = parse_id(&id, "order")?;
    Ok(Json(state.inventory.update_order_status(order_id, req).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

pub async fn inventory_summary<S, R>(
    State(state): State<Arc<AppState<S, R>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    Ok(Json(state.inventory.inventory_summary().await?))
}
