//! Inventory Application Service
//!
//! Orchestrates catalog, sales and purchasing through the repository port.
//! Every local-currency figure is derived from the rate published by the
//! rate service: open entities use the current value, finalized ones the
//! rate frozen on them.

use std::collections::HashMap;
use std::sync::Arc;

use inventory_types::{
    AppError, Category, CategoryId, CreateCategoryRequest, CreateCustomerRequest,
    CreateOrderRequest, CreateProductRequest, CreateSaleRequest, CreateSupplierRequest,
    CurrentRate, Customer, CustomerId, DomainError, InventoryRepository, InventorySummary,
    LineItem, LineItemRequest, Money, MovementKind, MovementQuery, Order, OrderId, OrderStatus,
    OrderView, Product, ProductFilter, ProductId, ProductView, QuoteRequest, RepoError, Sale,
    SaleId, SaleQuote, SaleStatus, SaleView, StockAdjustmentRequest, StockMovement, Supplier,
    SupplierId, USD, UpdateCategoryRequest, UpdateCustomerRequest, UpdateOrderStatusRequest,
    UpdateProductRequest, UpdateSupplierRequest,
};
use tokio::sync::watch;

const DEFAULT_MOVEMENT_LIMIT: i64 = 50;

const CSV_HEADERS: [&str; 12] = [
    "ID",
    "Name",
    "Description",
    "Category",
    "Price USD",
    "Price VES",
    "Stock",
    "Min Stock",
    "Max Stock",
    "Barcode",
    "Status",
    "Created",
];

/// Which kind of document a set of lines is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// Sold at the product's price; product must be active and in stock
    Sale,
    /// Bought at the product's cost
    Order,
}

/// Application service for inventory, sales and purchase orders.
///
/// Generic over `R: InventoryRepository`; the current rate is read from the
/// rate service's broadcast channel so reads never block on it.
pub struct InventoryService<R: InventoryRepository> {
    repo: Arc<R>,
    rates: watch::Receiver<CurrentRate>,
}

impl<R: InventoryRepository> InventoryService<R> {
    pub fn new(repo: Arc<R>, rates: watch::Receiver<CurrentRate>) -> Self {
        Self { repo, rates }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn current(&self) -> CurrentRate {
        *self.rates.borrow()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, AppError> {
        let category = Category::new(req.name, req.description, req.icon)?;
        self.repo.insert_category(&category).await?;
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        req: UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let mut category = self
            .repo
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {}", id)))?;
        req.apply_to(&mut category)?;
        self.repo.update_category(&category).await?;
        Ok(category)
    }

    /// Hard delete; products filed under the category become uncategorized.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), AppError> {
        self.repo.delete_category(id).await.map_err(|err| match err {
            RepoError::NotFound => AppError::NotFound(format!("Category {}", id)),
            other => other.into(),
        })?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    pub async fn create_supplier(&self, req: CreateSupplierRequest) -> Result<Supplier, AppError> {
        let supplier = req.into_supplier()?;
        self.repo.insert_supplier(&supplier).await?;
        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> Result<Supplier, AppError> {
        self.repo
            .get_supplier(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Supplier {}", id))))
    }

    /// Active suppliers ordered by name.
    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.repo.list_suppliers().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_supplier(
        &self,
        id: SupplierId,
        req: UpdateSupplierRequest,
    ) -> Result<Supplier, AppError> {
        let mut supplier = self.get_supplier(id).await?;
        req.apply_to(&mut supplier)?;
        self.repo.update_supplier(&supplier).await?;
        Ok(supplier)
    }

    /// Soft delete: existing orders keep pointing at the supplier, new ones
    /// are refused.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_supplier(&self, id: SupplierId) -> Result<Supplier, AppError> {
        let mut supplier = self.get_supplier(id).await?;
        if supplier.active {
            supplier.active = false;
            self.repo.update_supplier(&supplier).await?;
            tracing::info!(supplier_id = %id, "Supplier deactivated");
        }
        Ok(supplier)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_customer(&self, req: CreateCustomerRequest) -> Result<Customer, AppError> {
        let customer = req.into_customer()?;
        self.repo.insert_customer(&customer).await?;
        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        self.repo
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {}", id)))
    }

    /// Active customers ordered by name.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.list_customers().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        req: UpdateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let mut customer = self.get_customer(id).await?;
        req.apply_to(&mut customer)?;
        self.repo.update_customer(&customer).await?;
        Ok(customer)
    }

    /// Soft delete: past sales keep their link to the customer.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        let mut customer = self.get_customer(id).await?;
        if customer.active {
            customer.active = false;
            self.repo.update_customer(&customer).await?;
            tracing::info!(customer_id = %id, "Customer deactivated");
        }
        Ok(customer)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a product with its local price cached at the current rate.
    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_product(&self, req: CreateProductRequest) -> Result<ProductView, AppError> {
        let rate = self.current().rate;
        let product = req.into_product(rate)?;
        self.repo.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(ProductView::new(product, rate))
    }

    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, AppError> {
        let product = self.find_product(id).await?;
        Ok(ProductView::new(product, self.current().rate))
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductView>, AppError> {
        let rate = self.current().rate;
        let products = self.repo.list_products().await?;
        Ok(products
            .into_iter()
            .filter(|p| filter.matches(p))
            .map(|p| ProductView::new(p, rate))
            .collect())
    }

    /// Active products whose name, description or barcode contain `term`.
    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductView>, AppError> {
        let filter = ProductFilter {
            search: Some(term.to_string()),
            ..ProductFilter::default()
        };
        self.list_products(&filter).await
    }

    pub async fn low_stock_products(&self) -> Result<Vec<ProductView>, AppError> {
        let filter = ProductFilter {
            low_stock_only: true,
            ..ProductFilter::default()
        };
        self.list_products(&filter).await
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_product(
        &self,
        id: ProductId,
        req: UpdateProductRequest,
    ) -> Result<ProductView, AppError> {
        // A reprice landing mid-request can leave this cache one rate behind;
        // views always recompute at the live rate and the next change re-caches.
        let rate = self.current().rate;
        let mut product = self.find_product(id).await?;
        req.apply_to(&mut product, rate)?;
        self.repo.update_product(&product).await?;
        Ok(ProductView::new(product, rate))
    }

    /// Soft delete: the product stays referenced by past sales and orders.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_product(&self, id: ProductId) -> Result<ProductView, AppError> {
        let mut product = self.find_product(id).await?;
        if product.active {
            product.active = false;
            product.updated_at = chrono::Utc::now();
            self.repo.update_product(&product).await?;
            tracing::info!(product_id = %id, "Product deactivated");
        }
        Ok(ProductView::new(product, self.current().rate))
    }

    #[tracing::instrument(skip(self, req), fields(delta = req.delta))]
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        req: StockAdjustmentRequest,
    ) -> Result<ProductView, AppError> {
        if req.delta == 0 {
            return Err(AppError::BadRequest("Stock adjustment cannot be zero".into()));
        }
        let movement = StockMovement::adjustment(id, req.delta, req.reason.as_deref())?;
        let product = self.repo.adjust_stock(&movement).await?;
        tracing::info!(
            product_id = %id,
            stock = product.stock,
            reason = req.reason.as_deref().unwrap_or("manual"),
            "Stock adjusted"
        );
        Ok(ProductView::new(product, self.current().rate))
    }

    /// The stock ledger, newest first.
    pub async fn list_stock_movements(
        &self,
        query: &MovementQuery,
    ) -> Result<Vec<StockMovement>, AppError> {
        let limit = query.limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT);
        if limit <= 0 {
            return Err(AppError::BadRequest("Limit must be positive".into()));
        }
        if let Some(id) = query.product_id {
            self.find_product(id).await?;
        }
        self.repo
            .list_stock_movements(query.product_id, limit)
            .await
            .map_err(Into::into)
    }

    async fn find_product(&self, id: ProductId) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Sales
    // ─────────────────────────────────────────────────────────────────────────────

    /// Prices a cart at the current rate without recording anything.
    pub async fn quote_sale(&self, req: QuoteRequest) -> Result<SaleQuote, AppError> {
        let lines = self.resolve_lines(&req.lines, LineKind::Sale).await?;
        Ok(SaleQuote::new(&lines, self.current()))
    }

    /// Records a completed sale at the current rate and takes its goods out
    /// of stock.
    ///
    /// Stock is decremented line by line after the sale is stored; a line
    /// that fails at that point is logged and does not undo the sale.
    #[tracing::instrument(skip(self, req), fields(lines = req.lines.len()))]
    pub async fn create_sale(&self, req: CreateSaleRequest) -> Result<SaleView, AppError> {
        let customer = match req.customer_id {
            Some(id) => Some(self.active_customer(id).await?),
            None => None,
        };
        let lines = self.resolve_lines(&req.lines, LineKind::Sale).await?;
        let rate = self.current().rate;
        let name = req
            .customer
            .or_else(|| customer.as_ref().map(|c| c.name.clone()));
        let mut sale = Sale::complete(
            lines,
            Money::from_minor(req.discount_usd),
            rate,
            name,
            req.payment_method,
            req.notes,
        )?;
        sale.customer_id = customer.map(|c| c.id);

        self.repo.insert_sale(&sale).await?;
        let notes = format!("Sale {}", sale.id);
        for line in &sale.lines {
            self.move_stock(line.product_id, -line.quantity, MovementKind::Sale, &notes)
                .await;
        }

        tracing::info!(
            sale_id = %sale.id,
            total_usd = %sale.total_usd(),
            rate = rate.value(),
            "Sale recorded"
        );
        Ok(SaleView::from(sale))
    }

    pub async fn get_sale(&self, id: SaleId) -> Result<SaleView, AppError> {
        self.find_sale(id).await.map(SaleView::from)
    }

    pub async fn list_sales(&self) -> Result<Vec<SaleView>, AppError> {
        let sales = self.repo.list_sales().await?;
        Ok(sales.into_iter().map(SaleView::from).collect())
    }

    /// Cancels a sale and puts its goods back in stock.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale(&self, id: SaleId) -> Result<SaleView, AppError> {
        let mut sale = self.find_sale(id).await?;
        sale.cancel()?;
        self.repo.update_sale_status(id, SaleStatus::Cancelled).await?;
        let notes = format!("Sale {} cancelled", id);
        for line in &sale.lines {
            self.move_stock(
                line.product_id,
                line.quantity,
                MovementKind::SaleCancellation,
                &notes,
            )
            .await;
        }
        tracing::info!(sale_id = %id, "Sale cancelled");
        Ok(SaleView::from(sale))
    }

    async fn active_customer(&self, id: CustomerId) -> Result<Customer, AppError> {
        match self.repo.get_customer(id).await? {
            Some(customer) if customer.active => Ok(customer),
            Some(_) => Err(AppError::BadRequest(format!("Customer {} is inactive", id))),
            None => Err(AppError::BadRequest(format!("Customer {} does not exist", id))),
        }
    }

    async fn find_sale(&self, id: SaleId) -> Result<Sale, AppError> {
        self.repo
            .get_sale(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sale {}", id)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Purchase orders
    // ─────────────────────────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self, req), fields(supplier_id = %req.supplier_id))]
    pub async fn create_order(&self, req: CreateOrderRequest) -> Result<OrderView, AppError> {
        match self.repo.get_supplier(req.supplier_id).await? {
            Some(supplier) if supplier.active => {}
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "Supplier {} is inactive",
                    req.supplier_id
                )));
            }
            None => {
                return Err(AppError::BadRequest(format!(
                    "Supplier {} does not exist",
                    req.supplier_id
                )));
            }
        }
        let lines = self.resolve_lines(&req.lines, LineKind::Order).await?;
        let order = Order::pending(
            req.supplier_id,
            lines,
            req.priority,
            req.notes,
            req.expected_delivery,
        )?;

        self.repo.insert_order(&order).await?;
        tracing::info!(order_id = %order.id, "Purchase order created");
        Ok(OrderView::new(order, self.current().rate))
    }

    pub async fn get_order(&self, id: OrderId) -> Result<OrderView, AppError> {
        let order = self.find_order(id).await?;
        Ok(OrderView::new(order, self.current().rate))
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderView>, AppError> {
        let rate = self.current().rate;
        let orders = self.repo.list_orders().await?;
        Ok(orders
            .into_iter()
            .map(|o| OrderView::new(o, rate))
            .collect())
    }

    /// Moves an order through its lifecycle.
    ///
    /// The first transition into a received state freezes the current rate
    /// on the order and adds its goods to stock.
    #[tracing::instrument(skip(self, req), fields(status = %req.status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        req: UpdateOrderStatusRequest,
    ) -> Result<OrderView, AppError> {
        let rate = self.current().rate;
        let mut order = self.find_order(id).await?;
        let was_finalized = order.status.is_finalized();

        order.transition(req.status, rate)?;
        self.repo.update_order(&order).await?;

        if !was_finalized && order.status.is_finalized() {
            let notes = format!("Order {} received", id);
            for line in &order.lines {
                self.move_stock(line.product_id, line.quantity, MovementKind::Purchase, &notes)
                    .await;
            }
        }

        tracing::info!(order_id = %id, status = %order.status, "Order status updated");
        Ok(OrderView::new(order, rate))
    }

    async fn find_order(&self, id: OrderId) -> Result<Order, AppError> {
        self.repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {}", id)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn inventory_summary(&self) -> Result<InventorySummary, AppError> {
        let current = self.current();
        let products = self.repo.list_products().await?;
        let sales = self.repo.list_sales().await?;
        let orders = self.repo.list_orders().await?;

        let active: Vec<&Product> = products.iter().filter(|p| p.active).collect();
        let stock_value_usd: Money<USD> = active.iter().map(|p| p.stock_value_usd()).sum();
        let completed: Vec<&Sale> = sales
            .iter()
            .filter(|s| s.status == SaleStatus::Completed)
            .collect();

        Ok(InventorySummary {
            active_products: active.len(),
            low_stock_products: active.iter().filter(|p| p.is_low_stock()).count(),
            out_of_stock_products: active.iter().filter(|p| p.stock == 0).count(),
            total_units: active.iter().map(|p| p.stock as i64).sum(),
            stock_value_usd,
            stock_value_local: exchange_rates::to_local(stock_value_usd, current.rate),
            completed_sales: completed.len(),
            sales_total_usd: completed.iter().map(|s| s.total_usd()).sum(),
            sales_total_local: completed.iter().map(|s| s.total_local()).sum(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count(),
            rate: current,
        })
    }

    /// Exports every product as CSV.
    ///
    /// The local price comes from the product's cache when it was computed at
    /// the current rate, otherwise it is computed live.
    pub async fn export_products_csv(&self) -> Result<String, AppError> {
        let rate = self.current().rate;
        let products = self.repo.list_products().await?;
        let categories: HashMap<_, _> = self
            .repo
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS).map_err(csv_error)?;

        for product in &products {
            let price_local = if product.cached_rate == rate {
                product.cached_price_local
            } else {
                product.price_local(rate)
            };
            let category = product
                .category_id
                .and_then(|id| categories.get(&id))
                .map(String::as_str)
                .unwrap_or("");

            writer
                .write_record([
                    product.id.to_string(),
                    product.name.clone(),
                    product.description.clone(),
                    category.to_string(),
                    format!("{:.2}", product.price_usd.to_decimal()),
                    format!("{:.2}", price_local.to_decimal()),
                    product.stock.to_string(),
                    product.stock_min.to_string(),
                    product.stock_max.to_string(),
                    product.barcode.clone(),
                    if product.active { "Active" } else { "Inactive" }.to_string(),
                    product.created_at.format("%Y-%m-%d").to_string(),
                ])
                .map_err(csv_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Turns requested lines into priced line items.
    ///
    /// Unit prices default to the product's price for sales and its cost for
    /// orders. Sale lines are checked against the stock on hand, summing
    /// repeated products.
    async fn resolve_lines(
        &self,
        requested: &[LineItemRequest],
        kind: LineKind,
    ) -> Result<Vec<LineItem>, AppError> {
        if requested.is_empty() {
            return Err(AppError::BadRequest("At least one line is required".into()));
        }

        let mut lines = Vec::with_capacity(requested.len());
        let mut wanted: HashMap<ProductId, (i32, i32)> = HashMap::new();

        for req in requested {
            let product = self.repo.get_product(req.product_id).await?.ok_or_else(|| {
                AppError::BadRequest(format!("Product {} does not exist", req.product_id))
            })?;

            let default_price = match kind {
                LineKind::Sale => product.price_usd,
                LineKind::Order => product.cost_usd,
            };
            let unit_price = req
                .unit_price_usd
                .map(Money::from_minor)
                .unwrap_or(default_price);
            let line = LineItem::new(product.id, req.quantity, unit_price)?;

            if kind == LineKind::Sale {
                if !product.active {
                    return Err(AppError::BadRequest(format!(
                        "Product {} is not for sale",
                        product.name
                    )));
                }
                let entry = wanted.entry(product.id).or_insert((0, product.stock));
                entry.0 = entry.0.saturating_add(line.quantity);
            }
            lines.push(line);
        }

        for (product_id, (requested, available)) in wanted {
            if requested > available {
                return Err(DomainError::InsufficientStock {
                    product_id,
                    available,
                    requested,
                }
                .into());
            }
        }

        Ok(lines)
    }

    async fn move_stock(&self, id: ProductId, delta: i32, kind: MovementKind, notes: &str) {
        let result = match StockMovement::new(id, delta, kind, Some(notes.to_string())) {
            Ok(movement) => self.repo.adjust_stock(&movement).await.map(|_| ()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            tracing::warn!(
                product_id = %id,
                delta,
                kind = %kind,
                error = %err,
                "Stock movement failed"
            );
        }
    }
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Internal(format!("CSV export failed: {}", err))
}
