//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use inventory_types::domain::{
    Category, CategoryId, CurrentRate, Customer, CustomerId, LineItem, MovementKind, Order,
    OrderId, OrderPriority, OrderStatus, Product, ProductId, RateId, RateRecord, RateSource, Sale,
    SaleId, SaleStatus, StockMovement, StockMovementId, Supplier, SupplierId,
};
use inventory_types::dto::{
    ConvertRequest, ConvertResponse, CreateCategoryRequest, CreateCustomerRequest,
    CreateOrderRequest, CreateProductRequest, CreateSaleRequest, CreateSupplierRequest,
    LineItemRequest, QuoteRequest, SetRateRequest, StockAdjustmentRequest,
    UpdateCategoryRequest, UpdateCustomerRequest, UpdateOrderStatusRequest, UpdateProductRequest,
    UpdateSupplierRequest,
};
use inventory_types::views::{
    InventorySummary, OrderView, PricedLine, ProductView, SaleQuote, SaleView,
};
use inventory_types::CurrencyCode;
use utoipa::OpenApi;

// Dummy functions to generate path documentation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange rate
// ─────────────────────────────────────────────────────────────────────────────

/// Rate currently in force
#[utoipa::path(
    get,
    path = "/api/rates/current",
    tag = "rates",
    responses(
        (status = 200, description = "Current rate with its source and observation time", body = CurrentRate)
    )
)]
async fn current_rate() {}

/// Refresh the rate from the external source
///
/// Falls back to the last stored rate, then to the value already held. Never fails.
#[utoipa::path(
    post,
    path = "/api/rates/refresh",
    tag = "rates",
    responses(
        (status = 200, description = "Rate in force after the refresh", body = CurrentRate)
    )
)]
async fn refresh_rate() {}

/// Set the rate by hand
#[utoipa::path(
    post,
    path = "/api/rates/manual",
    tag = "rates",
    request_body = SetRateRequest,
    responses(
        (status = 200, description = "Manual rate in force", body = CurrentRate),
        (status = 400, description = "Rate is zero, negative or not a number")
    )
)]
async fn set_manual_rate() {}

/// Rate history, most recent first
#[utoipa::path(
    get,
    path = "/api/rates/history",
    tag = "rates",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum records to return (default 30)")
    ),
    responses(
        (status = 200, description = "Stored rate records", body = Vec<RateRecord>),
        (status = 400, description = "Invalid limit")
    )
)]
async fn rate_history() {}

/// Convert an amount at the current rate
#[utoipa::path(
    post,
    path = "/api/rates/convert",
    tag = "rates",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Converted amount", body = ConvertResponse)
    )
)]
async fn convert() {}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "catalog",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Empty or duplicate name")
    )
)]
async fn create_category() {}

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
async fn list_categories() {}

/// Update a category
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    tag = "catalog",
    request_body = UpdateCategoryRequest,
    params(
        ("id" = CategoryId, Path, description = "Category ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated category", body = Category),
        (status = 400, description = "Empty or duplicate name"),
        (status = 404, description = "Category not found")
    )
)]
async fn update_category() {}

/// Delete a category
///
/// Products filed under it become uncategorized.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "catalog",
    params(
        ("id" = CategoryId, Path, description = "Category ID (UUID)")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    )
)]
async fn delete_category() {}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "catalog",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_supplier() {}

/// List active suppliers by name
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "catalog",
    responses(
        (status = 200, description = "Active suppliers", body = Vec<Supplier>)
    )
)]
async fn list_suppliers() {}

/// Get supplier by ID
#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    tag = "catalog",
    params(
        ("id" = SupplierId, Path, description = "Supplier ID (UUID)")
    ),
    responses(
        (status = 200, description = "Supplier details", body = Supplier),
        (status = 404, description = "Supplier not found")
    )
)]
async fn get_supplier() {}

/// Update a supplier's contact details
#[utoipa::path(
    patch,
    path = "/api/suppliers/{id}",
    tag = "catalog",
    request_body = UpdateSupplierRequest,
    params(
        ("id" = SupplierId, Path, description = "Supplier ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated supplier", body = Supplier),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Supplier not found")
    )
)]
async fn update_supplier() {}

/// Deactivate a supplier
#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    tag = "catalog",
    params(
        ("id" = SupplierId, Path, description = "Supplier ID (UUID)")
    ),
    responses(
        (status = 200, description = "Deactivated supplier", body = Supplier),
        (status = 404, description = "Supplier not found")
    )
)]
async fn deactivate_supplier() {}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

/// Register a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_customer() {}

/// List active customers by name
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "customers",
    responses(
        (status = 200, description = "Active customers", body = Vec<Customer>)
    )
)]
async fn list_customers() {}

/// Get customer by ID
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "customers",
    params(
        ("id" = CustomerId, Path, description = "Customer ID (UUID)")
    ),
    responses(
        (status = 200, description = "Customer details", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
async fn get_customer() {}

/// Update a customer
#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "customers",
    request_body = UpdateCustomerRequest,
    params(
        ("id" = CustomerId, Path, description = "Customer ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated customer", body = Customer),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Customer not found")
    )
)]
async fn update_customer() {}

/// Deactivate a customer
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "customers",
    params(
        ("id" = CustomerId, Path, description = "Customer ID (UUID)")
    ),
    responses(
        (status = 200, description = "Deactivated customer", body = Customer),
        (status = 404, description = "Customer not found")
    )
)]
async fn deactivate_customer() {}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created, priced at the current rate", body = ProductView),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_product() {}

/// List products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(
        ("search" = Option<String>, Query, description = "Match on name, description or barcode"),
        ("category_id" = Option<CategoryId>, Query, description = "Only this category"),
        ("low_stock_only" = Option<bool>, Query, description = "Only products below their minimum stock"),
        ("include_inactive" = Option<bool>, Query, description = "Include deactivated products")
    ),
    responses(
        (status = 200, description = "Products with live local prices", body = Vec<ProductView>)
    )
)]
async fn list_products() {}

/// Products below their minimum stock
#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    tag = "products",
    responses(
        (status = 200, description = "Low stock products", body = Vec<ProductView>)
    )
)]
async fn low_stock_products() {}

/// Export products as CSV
#[utoipa::path(
    get,
    path = "/api/products/export",
    tag = "products",
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String)
    )
)]
async fn export_products() {}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = ProductId, Path, description = "Product ID (UUID)")
    ),
    responses(
        (status = 200, description = "Product details", body = ProductView),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product() {}

/// Update a product
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    tag = "products",
    request_body = UpdateProductRequest,
    params(
        ("id" = ProductId, Path, description = "Product ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated product", body = ProductView),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Product not found")
    )
)]
async fn update_product() {}

/// Deactivate a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = ProductId, Path, description = "Product ID (UUID)")
    ),
    responses(
        (status = 200, description = "Deactivated product", body = ProductView),
        (status = 404, description = "Product not found")
    )
)]
async fn deactivate_product() {}

/// Adjust stock on hand
#[utoipa::path(
    post,
    path = "/api/products/{id}/stock",
    tag = "products",
    request_body = StockAdjustmentRequest,
    params(
        ("id" = ProductId, Path, description = "Product ID (UUID)")
    ),
    responses(
        (status = 200, description = "Product with new stock", body = ProductView),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Stock would go below zero")
    )
)]
async fn adjust_stock() {}

/// Stock movement ledger, newest first
#[utoipa::path(
    get,
    path = "/api/stock-movements",
    tag = "products",
    params(
        ("product_id" = Option<ProductId>, Query, description = "Only this product"),
        ("limit" = Option<i64>, Query, description = "Maximum movements to return (default 50)")
    ),
    responses(
        (status = 200, description = "Recorded movements", body = Vec<StockMovement>),
        (status = 400, description = "Invalid limit"),
        (status = 404, description = "Product not found")
    )
)]
async fn list_stock_movements() {}

// ─────────────────────────────────────────────────────────────────────────────
// Sales
// ─────────────────────────────────────────────────────────────────────────────

/// Price a cart at the current rate
#[utoipa::path(
    post,
    path = "/api/sales/quote",
    tag = "sales",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Priced cart", body = SaleQuote),
        (status = 400, description = "Invalid lines"),
        (status = 409, description = "Not enough stock")
    )
)]
async fn quote_sale() {}

/// Record a sale
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded at the current rate", body = SaleView),
        (status = 400, description = "Invalid lines"),
        (status = 409, description = "Not enough stock")
    )
)]
async fn create_sale() {}

/// List sales, newest first
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "sales",
    responses(
        (status = 200, description = "Sales at their frozen rates", body = Vec<SaleView>)
    )
)]
async fn list_sales() {}

/// Get sale by ID
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "sales",
    params(
        ("id" = SaleId, Path, description = "Sale ID (UUID)")
    ),
    responses(
        (status = 200, description = "Sale details", body = SaleView),
        (status = 404, description = "Sale not found")
    )
)]
async fn get_sale() {}

/// Cancel a sale
#[utoipa::path(
    post,
    path = "/api/sales/{id}/cancel",
    tag = "sales",
    params(
        ("id" = SaleId, Path, description = "Sale ID (UUID)")
    ),
    responses(
        (status = 200, description = "Cancelled sale", body = SaleView),
        (status = 404, description = "Sale not found"),
        (status = 409, description = "Sale already cancelled")
    )
)]
async fn cancel_sale() {}

// ─────────────────────────────────────────────────────────────────────────────
// Purchase orders
// ─────────────────────────────────────────────────────────────────────────────

/// Create a purchase order
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Pending order", body = OrderView),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_order() {}

/// List purchase orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    responses(
        (status = 200, description = "Orders", body = Vec<OrderView>)
    )
)]
async fn list_orders() {}

/// Get purchase order by ID
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "orders",
    params(
        ("id" = OrderId, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Order details", body = OrderView),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order() {}

/// Move a purchase order to a new status
#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    tag = "orders",
    request_body = UpdateOrderStatusRequest,
    params(
        ("id" = OrderId, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Updated order", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
async fn update_order_status() {}

/// Inventory and sales totals
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    tag = "reports",
    responses(
        (status = 200, description = "Summary at the current rate", body = InventorySummary)
    )
)]
async fn inventory_summary() {}

/// OpenAPI documentation for the inventory API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dual-Currency Inventory API",
        version = "1.0.0",
        description = "Inventory, sales and purchase orders priced in US dollars and shown in bolívares.\n\nAll money fields are integers in minor units (cents / céntimos). Open records are priced at the current exchange rate; completed sales and received orders keep the rate they were finalized at.",
        license(name = "MIT"),
    ),
    paths(
        health,
        current_rate,
        refresh_rate,
        set_manual_rate,
        rate_history,
        convert,
        create_category,
        list_categories,
        update_category,
        delete_category,
        create_supplier,
        list_suppliers,
        get_supplier,
        update_supplier,
        deactivate_supplier,
        create_customer,
        list_customers,
        get_customer,
        update_customer,
        deactivate_customer,
        create_product,
        list_products,
        low_stock_products,
        export_products,
        get_product,
        update_product,
        deactivate_product,
        adjust_stock,
        list_stock_movements,
        quote_sale,
        create_sale,
        list_sales,
        get_sale,
        cancel_sale,
        create_order,
        list_orders,
        get_order,
        update_order_status,
        inventory_summary,
    ),
    components(
        schemas(
            CurrentRate,
            RateRecord,
            RateSource,
            RateId,
            SetRateRequest,
            ConvertRequest,
            ConvertResponse,
            CurrencyCode,
            Category,
            CategoryId,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            Supplier,
            SupplierId,
            CreateSupplierRequest,
            UpdateSupplierRequest,
            Customer,
            CustomerId,
            CreateCustomerRequest,
            UpdateCustomerRequest,
            Product,
            ProductId,
            ProductView,
            CreateProductRequest,
            UpdateProductRequest,
            StockAdjustmentRequest,
            StockMovement,
            StockMovementId,
            MovementKind,
            LineItem,
            LineItemRequest,
            PricedLine,
            QuoteRequest,
            SaleQuote,
            Sale,
            SaleId,
            SaleStatus,
            SaleView,
            CreateSaleRequest,
            Order,
            OrderId,
            OrderStatus,
            OrderPriority,
            OrderView,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            InventorySummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rates", description = "Exchange rate in force, refresh, manual override and history"),
        (name = "catalog", description = "Categories and suppliers"),
        (name = "customers", description = "Registered customers"),
        (name = "products", description = "Products, stock, ledger and export"),
        (name = "sales", description = "Quotes and sales"),
        (name = "orders", description = "Purchase orders to suppliers"),
        (name = "reports", description = "Dashboard figures"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/rates/current",
            "/api/rates/manual",
            "/api/products/{id}/stock",
            "/api/stock-movements",
            "/api/categories/{id}",
            "/api/customers",
            "/api/customers/{id}",
            "/api/sales/{id}/cancel",
            "/api/orders/{id}/status",
            "/api/reports/summary",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }
}
