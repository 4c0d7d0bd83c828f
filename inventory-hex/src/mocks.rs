//! In-memory port implementations shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inventory_types::{
    Category, CategoryId, Customer, CustomerId, DomainError, ExternalRateSource,
    InventoryRepository, Order, OrderId, Product, ProductId, Rate, RateError,
    RateHistoryRepository, RateRecord, RepoError, Sale, SaleId, SaleStatus, StockMovement,
    Supplier, SupplierId,
};
use tokio::sync::Notify;

// ─────────────────────────────────────────────────────────────────────────────
// Rate source
// ─────────────────────────────────────────────────────────────────────────────

/// Answers from a script, repeating the last answer once exhausted.
pub struct MockSource {
    script: Mutex<VecDeque<Result<f64, String>>>,
    last: Mutex<Result<f64, String>>,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl MockSource {
    pub fn scripted(answers: Vec<Result<f64, String>>) -> Self {
        Self {
            script: Mutex::new(answers.into()),
            last: Mutex::new(Err("script exhausted".into())),
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    pub fn always(value: f64) -> Self {
        Self::scripted(vec![Ok(value)])
    }

    pub fn failing() -> Self {
        Self::scripted(vec![Err("connection refused".into())])
    }

    /// Holds every fetch until the returned `Notify` is signalled.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ExternalRateSource for MockSource {
    async fn fetch_rate(&self) -> Result<Rate, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let answer = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = script.pop_front() {
                *last = next.clone();
            }
            last.clone()
        };

        match answer {
            Ok(value) => Ok(Rate::new(value)?),
            Err(msg) => Err(RateError::Network(msg)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate history
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockHistory {
    records: Mutex<Vec<RateRecord>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub corrupt: AtomicBool,
}

impl MockHistory {
    pub fn seeded(record: RateRecord) -> Self {
        let history = Self::default();
        history.records.lock().unwrap().push(record);
        history
    }

    pub fn records(&self) -> Vec<RateRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateHistoryRepository for MockHistory {
    async fn record_rate(&self, record: &RateRecord) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Database("disk full".into()));
        }
        let mut records = self.records.lock().unwrap();
        for existing in records.iter_mut() {
            existing.active = false;
        }
        records.push(record.clone());
        Ok(())
    }

    async fn latest_active_rate(&self) -> Result<Option<RateRecord>, RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Database("connection reset".into()));
        }
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(RepoError::CorruptRate("0".into()));
        }
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().find(|r| r.active).cloned())
    }

    async fn list_rates(&self, limit: i64) -> Result<Vec<RateRecord>, RepoError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().take(limit as usize).cloned().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRepo {
    categories: Mutex<Vec<Category>>,
    suppliers: Mutex<HashMap<SupplierId, Supplier>>,
    customers: Mutex<HashMap<CustomerId, Customer>>,
    products: Mutex<HashMap<ProductId, Product>>,
    sales: Mutex<Vec<Sale>>,
    orders: Mutex<Vec<Order>>,
    movements: Mutex<Vec<StockMovement>>,
    /// Products whose stock movements fail after the fact
    pub broken_stock: Mutex<Vec<ProductId>>,
    pub reprices: AtomicUsize,
}

impl MockRepo {
    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl InventoryRepository for MockRepo {
    async fn insert_category(&self, category: &Category) -> Result<(), RepoError> {
        let mut categories = self.categories.lock().unwrap();
        if categories.iter().any(|c| c.name == category.name) {
            return Err(DomainError::ValidationError("Category already exists".into()).into());
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        let categories = self.categories.lock().unwrap();
        Ok(categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepoError> {
        let mut categories = self.categories.lock().unwrap();
        if categories
            .iter()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(DomainError::ValidationError("Category already exists".into()).into());
        }
        let stored = categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(RepoError::NotFound)?;
        *stored = category.clone();
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(RepoError::NotFound);
        }
        for product in self.products.lock().unwrap().values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(())
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), RepoError> {
        self.suppliers
            .lock()
            .unwrap()
            .insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepoError> {
        Ok(self.suppliers.lock().unwrap().get(&id).cloned())
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, RepoError> {
        let mut suppliers: Vec<Supplier> = self
            .suppliers
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), RepoError> {
        let mut suppliers = self.suppliers.lock().unwrap();
        let stored = suppliers.get_mut(&supplier.id).ok_or(RepoError::NotFound)?;
        *stored = supplier.clone();
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepoError> {
        Ok(self.customers.lock().unwrap().get(&id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        let mut customers: Vec<Customer> = self
            .customers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        let mut customers = self.customers.lock().unwrap();
        let stored = customers.get_mut(&customer.id).ok_or(RepoError::NotFound)?;
        *stored = customer.clone();
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepoError> {
        self.products
            .lock()
            .unwrap()
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepoError> {
        let mut products = self.products.lock().unwrap();
        let stored = products.get_mut(&product.id).ok_or(RepoError::NotFound)?;
        let stock = stored.stock;
        *stored = product.clone();
        stored.stock = stock;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let mut products: Vec<Product> = self.products.lock().unwrap().values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn adjust_stock(&self, movement: &StockMovement) -> Result<Product, RepoError> {
        let id = movement.product_id;
        if self.broken_stock.lock().unwrap().contains(&id) {
            return Err(RepoError::Database("lock timeout".into()));
        }
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or(RepoError::NotFound)?;
        product.apply_stock_delta(movement.quantity)?;
        self.movements.lock().unwrap().push(movement.clone());
        Ok(product.clone())
    }

    async fn list_stock_movements(
        &self,
        product_id: Option<ProductId>,
        limit: i64,
    ) -> Result<Vec<StockMovement>, RepoError> {
        let movements = self.movements.lock().unwrap();
        Ok(movements
            .iter()
            .rev()
            .filter(|m| product_id.is_none_or(|id| m.product_id == id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn reprice_products(&self, rate: Rate) -> Result<u64, RepoError> {
        self.reprices.fetch_add(1, Ordering::SeqCst);
        let mut products = self.products.lock().unwrap();
        for product in products.values_mut() {
            product.reprice(rate);
        }
        Ok(products.len() as u64)
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), RepoError> {
        self.sales.lock().unwrap().push(sale.clone());
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepoError> {
        Ok(self.sales.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, RepoError> {
        Ok(self.sales.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn update_sale_status(&self, id: SaleId, status: SaleStatus) -> Result<(), RepoError> {
        let mut sales = self.sales.lock().unwrap();
        let sale = sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepoError::NotFound)?;
        sale.status = status;
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        Ok(self.orders.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn update_order(&self, order: &Order) -> Result<(), RepoError> {
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(RepoError::NotFound)?;
        *stored = order.clone();
        Ok(())
    }
}
