//! Repository port traits.
//!
//! These are the primary ports in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement them.

use exchange_rates::Rate;

use crate::domain::{
    Category, CategoryId, Customer, CustomerId, Order, OrderId, Product, ProductId, RateRecord,
    Sale, SaleId, SaleStatus, StockMovement, Supplier, SupplierId,
};
use crate::error::RepoError;

/// Append-only store of exchange rate observations.
#[async_trait::async_trait]
pub trait RateHistoryRepository: Send + Sync + 'static {
    /// Stores `record` as the active rate.
    ///
    /// Every previously active record is deactivated in the same database
    /// transaction, so at most one record is active at any time.
    async fn record_rate(&self, record: &RateRecord) -> Result<(), RepoError>;

    /// The most recent active record, if any.
    async fn latest_active_rate(&self) -> Result<Option<RateRecord>, RepoError>;

    /// Most recent records first.
    async fn list_rates(&self, limit: i64) -> Result<Vec<RateRecord>, RepoError>;
}

/// Store for the catalog, sales and purchase orders.
#[async_trait::async_trait]
pub trait InventoryRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_category(&self, category: &Category) -> Result<(), RepoError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    async fn update_category(&self, category: &Category) -> Result<(), RepoError>;

    /// Removes a category for good. Products filed under it become
    /// uncategorized in the same transaction.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError>;

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), RepoError>;

    /// Returns inactive suppliers too.
    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepoError>;

    /// Active suppliers ordered by name.
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, RepoError>;

    /// Persists contact details and the active flag.
    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepoError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepoError>;

    /// Active customers ordered by name.
    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError>;

    async fn update_customer(&self, customer: &Customer) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_product(&self, product: &Product) -> Result<(), RepoError>;

    /// Overwrites every field of an existing product except `stock`.
    async fn update_product(&self, product: &Product) -> Result<(), RepoError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError>;

    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;

    /// Applies `movement.quantity` to the product's stock and appends the
    /// movement to the ledger, atomically.
    ///
    /// MUST fail with `DomainError::InsufficientStock` instead of letting
    /// stock go below zero; nothing is recorded then.
    async fn adjust_stock(&self, movement: &StockMovement) -> Result<Product, RepoError>;

    /// Newest first, optionally for one product only.
    async fn list_stock_movements(
        &self,
        product_id: Option<ProductId>,
        limit: i64,
    ) -> Result<Vec<StockMovement>, RepoError>;

    /// Re-caches the local price of every product at `rate`. Returns the
    /// number of products touched.
    async fn reprice_products(&self, rate: Rate) -> Result<u64, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Sales
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_sale(&self, sale: &Sale) -> Result<(), RepoError>;

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepoError>;

    /// Newest first.
    async fn list_sales(&self) -> Result<Vec<Sale>, RepoError>;

    async fn update_sale_status(&self, id: SaleId, status: SaleStatus) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Purchase orders
    // ─────────────────────────────────────────────────────────────────────────────

    async fn insert_order(&self, order: &Order) -> Result<(), RepoError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError>;

    /// Newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, RepoError>;

    /// Persists status, frozen rate and timestamps of an existing order.
    async fn update_order(&self, order: &Order) -> Result<(), RepoError>;
}
