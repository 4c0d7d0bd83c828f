//! # Inventory Client SDK
//!
//! A typed Rust client for the Inventory API.

use inventory_types::{
    Category, CategoryId, ConvertRequest, ConvertResponse, CreateCategoryRequest,
    CreateCustomerRequest, CreateOrderRequest, CreateProductRequest, CreateSaleRequest,
    CreateSupplierRequest, CurrencyCode, CurrentRate, Customer, CustomerId, InventorySummary,
    MovementQuery, OrderId, OrderStatus, OrderView, ProductFilter, ProductId, ProductView,
    QuoteRequest, RateRecord, SaleId, SaleQuote, SaleView, SetRateRequest,
    StockAdjustmentRequest, StockMovement, Supplier, SupplierId, UpdateCategoryRequest,
    UpdateCustomerRequest, UpdateOrderStatusRequest, UpdateProductRequest, UpdateSupplierRequest,
};
use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inventory API client.
#[derive(Clone)]
pub struct InventoryClient {
    base_url: String,
    http: Client,
}

impl InventoryClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange rate
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn current_rate(&self) -> Result<CurrentRate, ClientError> {
        self.get("/api/rates/current").await
    }

    /// Asks the server to refresh from its external source.
    pub async fn refresh_rate(&self) -> Result<CurrentRate, ClientError> {
        self.send(self.http.post(self.url("/api/rates/refresh")))
            .await
    }

    pub async fn set_rate(&self, rate: f64) -> Result<CurrentRate, ClientError> {
        self.post("/api/rates/manual", &SetRateRequest { rate }).await
    }

    /// Newest first.
    pub async fn rate_history(&self, limit: Option<i64>) -> Result<Vec<RateRecord>, ClientError> {
        let mut req = self.http.get(self.url("/api/rates/history"));
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        self.send(req).await
    }

    pub async fn convert(
        &self,
        amount: i64,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Result<ConvertResponse, ClientError> {
        self.post("/api/rates/convert", &ConvertRequest { amount, from, to })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, ClientError> {
        self.post("/api/categories", req).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.get("/api/categories").await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, ClientError> {
        self.patch(&format!("/api/categories/{}", id), req).await
    }

    /// Products filed under the category become uncategorized.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ClientError> {
        let path = format!("/api/categories/{}", id);
        let resp = self.http.delete(self.url(&path)).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(api_error(status.as_u16(), resp.text().await?))
        }
    }

    pub async fn create_supplier(&self, req: &CreateSupplierRequest) -> Result<Supplier, ClientError> {
        self.post("/api/suppliers", req).await
    }

    pub async fn get_supplier(&self, id: SupplierId) -> Result<Supplier, ClientError> {
        self.get(&format!("/api/suppliers/{}", id)).await
    }

    /// Active suppliers only.
    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, ClientError> {
        self.get("/api/suppliers").await
    }

    pub async fn update_supplier(
        &self,
        id: SupplierId,
        req: &UpdateSupplierRequest,
    ) -> Result<Supplier, ClientError> {
        self.patch(&format!("/api/suppliers/{}", id), req).await
    }

    pub async fn deactivate_supplier(&self, id: SupplierId) -> Result<Supplier, ClientError> {
        let path = format!("/api/suppliers/{}", id);
        self.send(self.http.delete(self.url(&path))).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_customer(&self, req: &CreateCustomerRequest) -> Result<Customer, ClientError> {
        self.post("/api/customers", req).await
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
        self.get(&format!("/api/customers/{}", id)).await
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ClientError> {
        self.get("/api/customers").await
    }

    pub async fn update_customer(
        &self,
        id: CustomerId,
        req: &UpdateCustomerRequest,
    ) -> Result<Customer, ClientError> {
        self.patch(&format!("/api/customers/{}", id), req).await
    }

    pub async fn deactivate_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
        let path = format!("/api/customers/{}", id);
        self.send(self.http.delete(self.url(&path))).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<ProductView, ClientError> {
        self.post("/api/products", req).await
    }

    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, ClientError> {
        self.get(&format!("/api/products/{}", id)).await
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductView>, ClientError> {
        self.send(self.http.get(self.url("/api/products")).query(filter))
            .await
    }

    pub async fn low_stock_products(&self) -> Result<Vec<ProductView>, ClientError> {
        self.get("/api/products/low-stock").await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        req: &UpdateProductRequest,
    ) -> Result<ProductView, ClientError> {
        self.patch(&format!("/api/products/{}", id), req).await
    }

    pub async fn deactivate_product(&self, id: ProductId) -> Result<ProductView, ClientError> {
        let path = format!("/api/products/{}", id);
        self.send(self.http.delete(self.url(&path))).await
    }

    pub async fn adjust_stock(
        &self,
        id: ProductId,
        delta: i32,
        reason: Option<String>,
    ) -> Result<ProductView, ClientError> {
        let req = StockAdjustmentRequest { delta, reason };
        self.post(&format!("/api/products/{}/stock", id), &req).await
    }

    /// The stock ledger, newest first.
    pub async fn stock_movements(
        &self,
        product_id: Option<ProductId>,
        limit: Option<i64>,
    ) -> Result<Vec<StockMovement>, ClientError> {
        let query = MovementQuery { product_id, limit };
        self.send(self.http.get(self.url("/api/stock-movements")).query(&query))
            .await
    }

    /// Downloads the product catalog as CSV text.
    pub async fn export_products_csv(&self) -> Result<String, ClientError> {
        let resp = self.http.get(self.url("/api/products/export")).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(api_error(status.as_u16(), body))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sales
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn quote_sale(&self, req: &QuoteRequest) -> Result<SaleQuote, ClientError> {
        self.post("/api/sales/quote", req).await
    }

    pub async fn create_sale(&self, req: &CreateSaleRequest) -> Result<SaleView, ClientError> {
        self.post("/api/sales", req).await
    }

    pub async fn get_sale(&self, id: SaleId) -> Result<SaleView, ClientError> {
        self.get(&format!("/api/sales/{}", id)).await
    }

    pub async fn list_sales(&self) -> Result<Vec<SaleView>, ClientError> {
        self.get("/api/sales").await
    }

    pub async fn cancel_sale(&self, id: SaleId) -> Result<SaleView, ClientError> {
        let path = format!("/api/sales/{}/cancel", id);
        self.send(self.http.post(self.url(&path))).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Purchase orders
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_order(&self, req: &CreateOrderRequest) -> Result<OrderView, ClientError> {
        self.post("/api/orders", req).await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, ClientError> {
        self.get(&format!("/api/orders/{}", id)).await
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderView>, ClientError> {
        self.get("/api/orders").await
    }

    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderView, ClientError> {
        let req = UpdateOrderStatusRequest { status };
        self.post(&format!("/api/orders/{}/status", id), &req).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn inventory_summary(&self) -> Result<InventorySummary, ClientError> {
        self.get("/api/reports/summary").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.http.patch(self.url(path)).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(status.as_u16(), body))
        }
    }
}

/// Prefers the `error` field of the JSON error body, falling back to the raw
/// body text.
fn api_error(status: u16, body: String) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    ClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = InventoryClient::new("http://localhost:3000");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = InventoryClient::new("http://localhost:3000/");
        assert_eq!(client.url("/health"), "http://localhost:3000/health");
    }

    #[test]
    fn test_api_error_uses_error_field() {
        let err = api_error(409, r#"{"error":"Insufficient stock","code":409}"#.to_string());
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Insufficient stock");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = api_error(502, "Bad Gateway".to_string());
        assert_eq!(err.to_string(), "API error: 502 - Bad Gateway");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let client = InventoryClient::new("http://127.0.0.1:9");
        let result = client.current_rate().await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}
