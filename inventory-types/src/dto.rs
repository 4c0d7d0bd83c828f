//! Data Transfer Objects (DTOs) for requests.

use chrono::NaiveDate;
use exchange_rates::{CurrencyCode, Money, Rate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Category, CategoryId, Customer, CustomerId, OrderPriority, OrderStatus, Product, ProductId,
    Supplier, SupplierId,
};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rate DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to set the exchange rate by hand.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetRateRequest {
    /// Local-currency units per US dollar
    #[schema(example = 40.0)]
    pub rate: f64,
}

/// Request to convert an amount between USD and local currency.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertRequest {
    /// Amount in the smallest unit of `from`
    #[schema(example = 1000)]
    pub amount: i64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

/// Result of a conversion at the current rate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    pub amount: i64,
    pub from: CurrencyCode,
    pub converted: i64,
    pub to: CurrencyCode,
    #[schema(value_type = f64)]
    pub rate: Rate,
}

/// Query parameters for the rate history listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Víveres")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Partial update of a category. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn apply_to(self, category: &mut Category) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        category.validate()
    }
}

/// Request to register a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSupplierRequest {
    #[schema(example = "Distribuidora Caracas")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CreateSupplierRequest {
    pub fn into_supplier(self) -> Result<Supplier, DomainError> {
        let mut supplier = Supplier::new(self.name, self.phone, self.email)?;
        supplier.address = self.address;
        Ok(supplier)
    }
}

/// Partial update of a supplier's contact details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UpdateSupplierRequest {
    pub fn apply_to(self, supplier: &mut Supplier) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            supplier.name = name;
        }
        if let Some(phone) = self.phone {
            supplier.phone = Some(phone);
        }
        if let Some(email) = self.email {
            supplier.email = Some(email);
        }
        if let Some(address) = self.address {
            supplier.address = Some(address);
        }
        supplier.validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register a customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    #[schema(example = "María Pérez")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "V-12345678")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CreateCustomerRequest {
    pub fn into_customer(self) -> Result<Customer, DomainError> {
        let mut customer = Customer::new(self.name)?;
        customer.document_id = self.document_id;
        customer.phone = self.phone;
        customer.email = self.email;
        customer.address = self.address;
        customer.validate()?;
        Ok(customer)
    }
}

/// Partial update of a customer. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn apply_to(self, customer: &mut Customer) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(document_id) = self.document_id {
            customer.document_id = Some(document_id);
        }
        if let Some(phone) = self.phone {
            customer.phone = Some(phone);
        }
        if let Some(email) = self.email {
            customer.email = Some(email);
        }
        if let Some(address) = self.address {
            customer.address = Some(address);
        }
        customer.validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Product DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Harina PAN 1kg")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Price in cents
    #[schema(example = 150)]
    pub price_usd: i64,
    /// Cost in cents
    #[serde(default)]
    pub cost_usd: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub stock_min: Option<i32>,
    #[serde(default)]
    pub stock_max: Option<i32>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    /// Builds a validated product priced at `rate`.
    pub fn into_product(self, rate: Rate) -> Result<Product, DomainError> {
        let mut product = Product::new(self.name, Money::from_minor(self.price_usd), rate);
        product.description = self.description.unwrap_or_default();
        product.category_id = self.category_id;
        product.cost_usd = Money::from_minor(self.cost_usd);
        product.stock = self.stock;
        if let Some(min) = self.stock_min {
            product.stock_min = min;
        }
        if let Some(max) = self.stock_max {
            product.stock_max = max;
        }
        product.barcode = self.barcode.unwrap_or_default();
        product.image_url = self.image_url.unwrap_or_default();
        product.validate()?;
        Ok(product)
    }
}

/// Partial update of a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price_usd: Option<i64>,
    pub cost_usd: Option<i64>,
    pub stock_min: Option<i32>,
    pub stock_max: Option<i32>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    /// Applies the update and re-caches the local price at `rate`.
    pub fn apply_to(self, product: &mut Product, rate: Rate) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(cost) = self.cost_usd {
            product.cost_usd = Money::from_minor(cost);
        }
        if let Some(min) = self.stock_min {
            product.stock_min = min;
        }
        if let Some(max) = self.stock_max {
            product.stock_max = max;
        }
        if let Some(barcode) = self.barcode {
            product.barcode = barcode;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
        if let Some(price) = self.price_usd {
            product.price_usd = Money::from_minor(price);
        }
        product.reprice(rate);
        product.validate()
    }
}

/// Request to move stock up or down.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockAdjustmentRequest {
    /// Positive to add stock, negative to remove it
    #[schema(example = -2)]
    pub delta: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "ajuste")]
    pub reason: Option<String>,
}

/// Query parameters for the stock movement ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MovementQuery {
    /// Only movements of this product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// In-memory filter over the product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProductFilter {
    /// Case-insensitive match on name, description or barcode
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub low_stock_only: bool,
    #[serde(default)]
    pub include_inactive: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.active {
            return false;
        }
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        if self.low_stock_only && !product.is_low_stock() {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                product.name.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
                    || product.barcode.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sale & Order DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// One requested line of a sale or order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    #[schema(example = 2)]
    pub quantity: i32,
    /// Unit price in cents; defaults to the product's current price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_usd: Option<i64>,
}

/// Request to price a cart without recording anything.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub lines: Vec<LineItemRequest>,
}

/// Request to record a completed sale.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSaleRequest {
    pub lines: Vec<LineItemRequest>,
    /// Discount in cents
    #[serde(default)]
    pub discount_usd: i64,
    /// Registered customer; their name is used when `customer` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Efectivo")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request to place a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub supplier_id: SupplierId,
    pub lines: Vec<LineItemRequest>,
    #[serde(default)]
    pub priority: OrderPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<NaiveDate>,
}

/// Request to move an order along its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
