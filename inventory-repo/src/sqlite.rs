//! SQLite repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use inventory_types::{
    Category, CategoryId, Customer, CustomerId, DomainError, InventoryRepository, Order, OrderId,
    Product, ProductId, Rate, RateHistoryRepository, RateRecord, RepoError, Sale, SaleId,
    SaleStatus, StockMovement, Supplier, SupplierId,
};

use crate::map_insert_error;
use crate::types::sqlite::{
    DbCategory, DbCustomer, DbLine, DbMovement, DbOrder, DbProduct, DbRate, DbSale, DbStock,
    DbSupplier,
};
use crate::types::{group_lines, timestamp_text};

const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_create_tables",
    include_str!("../migrations/sqlite/0001_create_tables.sql"),
)];

const PRODUCT_COLUMNS: &str = "id, name, description, category_id, price_usd, cost_usd, stock, \
     stock_min, stock_max, barcode, image_url, active, cached_price_local, cached_rate, \
     created_at, updated_at";

const SUPPLIER_COLUMNS: &str = "id, name, phone, email, address, active, created_at";

const CUSTOMER_COLUMNS: &str =
    "id, name, document_id, phone, email, address, active, created_at";

const SALE_COLUMNS: &str =
    "id, customer_id, customer, payment_method, notes, discount_usd, rate, status, created_at";

const ORDER_COLUMNS: &str = "id, supplier_id, status, priority, notes, expected_delivery, rate, \
     created_at, received_at, paid_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let mut in_memory = false;

        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
        {
            let path = path.split('?').next().unwrap_or(path);
            if path == ":memory:" || path.is_empty() {
                in_memory = true;
            } else if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single connection keeps every query on the same in-memory database.
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.run_migrations().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> anyhow::Result<()> {
        for (name, sql) in MIGRATIONS {
            sqlx::raw_sql(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
            tracing::debug!(migration = name, "Applied SQLite migration");
        }
        Ok(())
    }

    async fn fetch_lines(&self, table: &str, parent_column: &str) -> Result<Vec<DbLine>, RepoError> {
        let sql = format!(
            "SELECT {parent_column} AS parent_id, product_id, quantity, unit_price_usd \
             FROM {table} ORDER BY {parent_column}, position"
        );
        sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    async fn fetch_lines_of(
        &self,
        table: &str,
        parent_column: &str,
        parent_id: String,
    ) -> Result<Vec<DbLine>, RepoError> {
        let sql = format!(
            "SELECT {parent_column} AS parent_id, product_id, quantity, unit_price_usd \
             FROM {table} WHERE {parent_column} = ? ORDER BY position"
        );
        sqlx::query_as(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

fn into_lines(rows: Vec<DbLine>) -> Result<Vec<inventory_types::LineItem>, RepoError> {
    rows.into_iter()
        .map(|row| row.into_domain().map(|(_, line)| line))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate history
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateHistoryRepository for SqliteRepo {
    async fn record_rate(&self, record: &RateRecord) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        if record.active {
            sqlx::query(r#"UPDATE exchange_rates SET active = 0 WHERE active = 1"#)
                .execute(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        sqlx::query(
            r#"INSERT INTO exchange_rates (id, rate, source, active, observed_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.rate.value())
        .bind(record.source.as_str())
        .bind(record.active)
        .bind(timestamp_text(record.observed_at))
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn latest_active_rate(&self) -> Result<Option<RateRecord>, RepoError> {
        let row: Option<DbRate> = sqlx::query_as(
            r#"SELECT id, rate, source, active, observed_at FROM exchange_rates
               WHERE active = 1 ORDER BY observed_at DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbRate::into_domain).transpose()
    }

    async fn list_rates(&self, limit: i64) -> Result<Vec<RateRecord>, RepoError> {
        let rows: Vec<DbRate> = sqlx::query_as(
            r#"SELECT id, rate, source, active, observed_at FROM exchange_rates
               ORDER BY observed_at DESC LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbRate::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl InventoryRepository for SqliteRepo {
    async fn insert_category(&self, category: &Category) -> Result<(), RepoError> {
        sqlx::query(r#"INSERT INTO categories (id, name, description, icon) VALUES (?, ?, ?, ?)"#)
            .bind(category.id.to_string())
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.icon)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Category"))?;
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        let row: Option<DbCategory> =
            sqlx::query_as(r#"SELECT id, name, description, icon FROM categories WHERE id = ?"#)
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCategory::into_domain).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let rows: Vec<DbCategory> =
            sqlx::query_as(r#"SELECT id, name, description, icon FROM categories ORDER BY name"#)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbCategory::into_domain).collect()
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepoError> {
        let result =
            sqlx::query(r#"UPDATE categories SET name = ?, description = ?, icon = ? WHERE id = ?"#)
                .bind(&category.name)
                .bind(&category.description)
                .bind(&category.icon)
                .bind(category.id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| map_insert_error(e, "Category"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError> {
        let id_str = id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        sqlx::query(r#"UPDATE products SET category_id = NULL WHERE category_id = ?"#)
            .bind(&id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let result = sqlx::query(r#"DELETE FROM categories WHERE id = ?"#)
            .bind(&id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), RepoError> {
        let sql = format!("INSERT INTO suppliers ({SUPPLIER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(supplier.id.to_string())
            .bind(&supplier.name)
            .bind(&supplier.phone)
            .bind(&supplier.email)
            .bind(&supplier.address)
            .bind(supplier.active)
            .bind(timestamp_text(supplier.created_at))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Supplier"))?;
        Ok(())
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepoError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?");
        let row: Option<DbSupplier> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbSupplier::into_domain).transpose()
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, RepoError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE active = 1 ORDER BY name");
        let rows: Vec<DbSupplier> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbSupplier::into_domain).collect()
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE suppliers SET name = ?, phone = ?, email = ?, address = ?, active = ?
               WHERE id = ?"#,
        )
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.active)
        .bind(supplier.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        let sql =
            format!("INSERT INTO customers ({CUSTOMER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(customer.id.to_string())
            .bind(&customer.name)
            .bind(&customer.document_id)
            .bind(&customer.phone)
            .bind(&customer.email)
            .bind(&customer.address)
            .bind(customer.active)
            .bind(timestamp_text(customer.created_at))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Customer"))?;
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?");
        let row: Option<DbCustomer> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCustomer::into_domain).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE active = 1 ORDER BY name");
        let rows: Vec<DbCustomer> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbCustomer::into_domain).collect()
    }

    async fn update_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE customers SET name = ?, document_id = ?, phone = ?, email = ?, address = ?,
                   active = ?
               WHERE id = ?"#,
        )
        .bind(&customer.name)
        .bind(&customer.document_id)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.active)
        .bind(customer.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepoError> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(product.id.to_string())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.category_id.map(|id| id.to_string()))
            .bind(product.price_usd.minor_units())
            .bind(product.cost_usd.minor_units())
            .bind(product.stock)
            .bind(product.stock_min)
            .bind(product.stock_max)
            .bind(&product.barcode)
            .bind(&product.image_url)
            .bind(product.active)
            .bind(product.cached_price_local.minor_units())
            .bind(product.cached_rate.value())
            .bind(timestamp_text(product.created_at))
            .bind(timestamp_text(product.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Product"))?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE products SET name = ?, description = ?, category_id = ?, price_usd = ?,
                   cost_usd = ?, stock_min = ?, stock_max = ?, barcode = ?, image_url = ?,
                   active = ?, cached_price_local = ?, cached_rate = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.map(|id| id.to_string()))
        .bind(product.price_usd.minor_units())
        .bind(product.cost_usd.minor_units())
        .bind(product.stock_min)
        .bind(product.stock_max)
        .bind(&product.barcode)
        .bind(&product.image_url)
        .bind(product.active)
        .bind(product.cached_price_local.minor_units())
        .bind(product.cached_rate.value())
        .bind(timestamp_text(product.updated_at))
        .bind(product.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row: Option<DbProduct> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbProduct::into_domain).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        let rows: Vec<DbProduct> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbProduct::into_domain).collect()
    }

    async fn adjust_stock(&self, movement: &StockMovement) -> Result<Product, RepoError> {
        let id = movement.product_id;
        let id_str = id.to_string();
        let delta = movement.quantity;

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let result = sqlx::query(
            r#"UPDATE products SET stock = stock + ?, updated_at = ?
               WHERE id = ? AND stock + ? >= 0"#,
        )
        .bind(delta)
        .bind(timestamp_text(Utc::now()))
        .bind(&id_str)
        .bind(delta)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            let row: Option<DbStock> = sqlx::query_as(r#"SELECT stock FROM products WHERE id = ?"#)
                .bind(&id_str)
                .fetch_optional(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

            let current = row.ok_or(RepoError::NotFound)?;
            return Err(RepoError::Domain(DomainError::InsufficientStock {
                product_id: id,
                available: current.stock,
                requested: -delta,
            }));
        }

        sqlx::query(
            r#"INSERT INTO stock_movements (id, product_id, quantity, kind, notes, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(movement.id.to_string())
        .bind(&id_str)
        .bind(delta)
        .bind(movement.kind.as_str())
        .bind(&movement.notes)
        .bind(timestamp_text(movement.created_at))
        .execute(&mut *db_tx)
        .await
        .map_err(|e| map_insert_error(e, "Stock movement"))?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row: DbProduct = sqlx::query_as(&sql)
            .bind(&id_str)
            .fetch_one(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        row.into_domain()
    }

    async fn list_stock_movements(
        &self,
        product_id: Option<ProductId>,
        limit: i64,
    ) -> Result<Vec<StockMovement>, RepoError> {
        let filter = if product_id.is_some() {
            "WHERE product_id = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT id, product_id, quantity, kind, notes, created_at FROM stock_movements \
             {filter} ORDER BY created_at DESC LIMIT ?"
        );

        let mut query = sqlx::query_as::<_, DbMovement>(&sql);
        if let Some(id) = product_id {
            query = query.bind(id.to_string());
        }
        let rows = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbMovement::into_domain).collect()
    }

    async fn reprice_products(&self, rate: Rate) -> Result<u64, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products");
        let rows: Vec<DbProduct> = sqlx::query_as(&sql)
            .fetch_all(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let now = timestamp_text(Utc::now());
        let mut touched = 0;
        for row in rows {
            let product = row.into_domain()?;
            let local = product.price_local(rate);
            let result = sqlx::query(
                r#"UPDATE products SET cached_price_local = ?, cached_rate = ?, updated_at = ?
                   WHERE id = ?"#,
            )
            .bind(local.minor_units())
            .bind(rate.value())
            .bind(&now)
            .bind(product.id.to_string())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
            touched += result.rows_affected();
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(touched)
    }

    async fn insert_sale(&self, sale: &Sale) -> Result<(), RepoError> {
        let sale_id = sale.id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!("INSERT INTO sales ({SALE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(&sale_id)
            .bind(sale.customer_id.map(|id| id.to_string()))
            .bind(&sale.customer)
            .bind(&sale.payment_method)
            .bind(&sale.notes)
            .bind(sale.discount_usd.minor_units())
            .bind(sale.rate.value())
            .bind(sale.status.as_str())
            .bind(timestamp_text(sale.created_at))
            .execute(&mut *db_tx)
            .await
            .map_err(|e| map_insert_error(e, "Sale"))?;

        for (position, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO sale_lines (sale_id, position, product_id, quantity, unit_price_usd)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(&sale_id)
            .bind(position as i64)
            .bind(line.product_id.to_string())
            .bind(line.quantity)
            .bind(line.unit_price_usd.minor_units())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepoError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?");
        let row: Option<DbSale> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self
            .fetch_lines_of("sale_lines", "sale_id", id.to_string())
            .await?;
        row.into_domain(into_lines(lines)?).map(Some)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, RepoError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC");
        let rows: Vec<DbSale> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let lines = self
            .fetch_lines("sale_lines", "sale_id")
            .await?
            .into_iter()
            .map(DbLine::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let mut lines = group_lines(lines);

        rows.into_iter()
            .map(|row| {
                let id = uuid::Uuid::parse_str(&row.id)
                    .map_err(|e| RepoError::Database(e.to_string()))?;
                row.into_domain(lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn update_sale_status(&self, id: SaleId, status: SaleStatus) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE sales SET status = ? WHERE id = ?"#)
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        let order_id = order.id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(&order_id)
            .bind(order.supplier_id.to_string())
            .bind(order.status.as_str())
            .bind(order.priority.as_str())
            .bind(&order.notes)
            .bind(order.expected_delivery)
            .bind(order.rate.map(|r| r.value()))
            .bind(timestamp_text(order.created_at))
            .bind(order.received_at.map(timestamp_text))
            .bind(order.paid_at.map(timestamp_text))
            .execute(&mut *db_tx)
            .await
            .map_err(|e| map_insert_error(e, "Order"))?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO order_lines (order_id, position, product_id, quantity, unit_price_usd)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(&order_id)
            .bind(position as i64)
            .bind(line.product_id.to_string())
            .bind(line.quantity)
            .bind(line.unit_price_usd.minor_units())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row: Option<DbOrder> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self
            .fetch_lines_of("order_lines", "order_id", id.to_string())
            .await?;
        row.into_domain(into_lines(lines)?).map(Some)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows: Vec<DbOrder> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let lines = self
            .fetch_lines("order_lines", "order_id")
            .await?
            .into_iter()
            .map(DbLine::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let mut lines = group_lines(lines);

        rows.into_iter()
            .map(|row| {
                let id = uuid::Uuid::parse_str(&row.id)
                    .map_err(|e| RepoError::Database(e.to_string()))?;
                row.into_domain(lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn update_order(&self, order: &Order) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE orders SET status = ?, priority = ?, notes = ?, rate = ?,
                   received_at = ?, paid_at = ?
               WHERE id = ?"#,
        )
        .bind(order.status.as_str())
        .bind(order.priority.as_str())
        .bind(&order.notes)
        .bind(order.rate.map(|r| r.value()))
        .bind(order.received_at.map(timestamp_text))
        .bind(order.paid_at.map(timestamp_text))
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
