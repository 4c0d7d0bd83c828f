//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use inventory_types::{
    Category, CategoryId, Customer, CustomerId, DomainError, InventoryRepository, LineItem, Order,
    OrderId, Product, ProductId, Rate, RateHistoryRepository, RateRecord, RepoError, Sale, SaleId,
    SaleStatus, StockMovement, Supplier, SupplierId,
};

use crate::map_insert_error;
use crate::types::group_lines;
use crate::types::postgres::{
    DbCategory, DbCustomer, DbLine, DbMovement, DbOrder, DbProduct, DbRate, DbSale, DbStock,
    DbSupplier,
};

const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_create_tables",
    include_str!("../migrations/postgres/0001_create_tables.sql"),
)];

const PRODUCT_COLUMNS: &str = "id, name, description, category_id, price_usd, cost_usd, stock, \
     stock_min, stock_max, barcode, image_url, active, cached_price_local, cached_rate, \
     created_at, updated_at";

const ORDER_COLUMNS: &str = "id, supplier_id, status, priority, notes, expected_delivery, rate, \
     created_at, received_at, paid_at";

const SALE_COLUMNS: &str =
    "id, customer_id, customer, payment_method, notes, discount_usd, rate, status, created_at";

const SUPPLIER_COLUMNS: &str = "id, name, phone, email, address, active, created_at";

const CUSTOMER_COLUMNS: &str =
    "id, name, document_id, phone, email, address, active, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository. Stock changes rely on conditional updates
/// rather than application-side checks.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    for (name, sql) in MIGRATIONS {
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        tracing::debug!(migration = name, "Applied PostgreSQL migration");
    }
    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_lines(
        &self,
        table: &str,
        parent_column: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<(Uuid, LineItem)>, RepoError> {
        let filter = if parent_id.is_some() {
            format!("WHERE {parent_column} = $1")
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT {parent_column} AS parent_id, product_id, quantity, unit_price_usd \
             FROM {table} {filter} ORDER BY {parent_column}, position"
        );

        let mut query = sqlx::query_as::<_, DbLine>(&sql);
        if let Some(id) = parent_id {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbLine::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate history
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateHistoryRepository for PostgresRepo {
    async fn record_rate(&self, record: &RateRecord) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        if record.active {
            sqlx::query(r#"UPDATE exchange_rates SET active = FALSE WHERE active"#)
                .execute(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        sqlx::query(
            r#"INSERT INTO exchange_rates (id, rate, source, active, observed_at) VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(record.id.into_uuid())
        .bind(record.rate.value())
        .bind(record.source.as_str())
        .bind(record.active)
        .bind(record.observed_at)
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
               WHERE active ORDER BY observed_at DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbRate::into_domain).transpose()
    }

    async fn list_rates(&self, limit: i64) -> Result<Vec<RateRecord>, RepoError> {
        let rows: Vec<DbRate> = sqlx::query_as(
            r#"SELECT id, rate, source, active, observed_at FROM exchange_rates
               ORDER BY observed_at DESC LIMIT $1"#,
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
impl InventoryRepository for PostgresRepo {
    async fn insert_category(&self, category: &Category) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO categories (id, name, description, icon) VALUES ($1, $2, $3, $4)"#,
        )
        .bind(category.id.into_uuid())
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
            sqlx::query_as(r#"SELECT id, name, description, icon FROM categories WHERE id = $1"#)
                .bind(id.into_uuid())
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
        let result = sqlx::query(
            r#"UPDATE categories SET name = $1, description = $2, icon = $3 WHERE id = $4"#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(category.id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Category"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        sqlx::query(r#"UPDATE products SET category_id = NULL WHERE category_id = $1"#)
            .bind(id.into_uuid())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let result = sqlx::query(r#"DELETE FROM categories WHERE id = $1"#)
            .bind(id.into_uuid())
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
        let sql = format!(
            "INSERT INTO suppliers ({SUPPLIER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        sqlx::query(&sql)
            .bind(supplier.id.into_uuid())
            .bind(&supplier.name)
            .bind(&supplier.phone)
            .bind(&supplier.email)
            .bind(&supplier.address)
            .bind(supplier.active)
            .bind(supplier.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Supplier"))?;
        Ok(())
    }

    async fn get_supplier(&self, id: SupplierId) -> Result<Option<Supplier>, RepoError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1");
        let row: Option<DbSupplier> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbSupplier::into_domain).transpose()
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, RepoError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE active ORDER BY name");
        let rows: Vec<DbSupplier> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbSupplier::into_domain).collect()
    }

    async fn update_supplier(&self, supplier: &Supplier) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE suppliers SET name = $1, phone = $2, email = $3, address = $4, active = $5
               WHERE id = $6"#,
        )
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.active)
        .bind(supplier.id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        let sql = format!(
            "INSERT INTO customers ({CUSTOMER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&sql)
            .bind(customer.id.into_uuid())
            .bind(&customer.name)
            .bind(&customer.document_id)
            .bind(&customer.phone)
            .bind(&customer.email)
            .bind(&customer.address)
            .bind(customer.active)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Customer"))?;
        Ok(())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row: Option<DbCustomer> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCustomer::into_domain).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE active ORDER BY name");
        let rows: Vec<DbCustomer> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbCustomer::into_domain).collect()
    }

    async fn update_customer(&self, customer: &Customer) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE customers SET name = $1, document_id = $2, phone = $3, email = $4,
                   address = $5, active = $6
               WHERE id = $7"#,
        )
        .bind(&customer.name)
        .bind(&customer.document_id)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.active)
        .bind(customer.id.into_uuid())
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
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        );
        sqlx::query(&sql)
            .bind(product.id.into_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.category_id.map(|id| id.into_uuid()))
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
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "Product"))?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE products SET name = $1, description = $2, category_id = $3, price_usd = $4,
                   cost_usd = $5, stock_min = $6, stock_max = $7, barcode = $8, image_url = $9,
                   active = $10, cached_price_local = $11, cached_rate = $12, updated_at = $13
               WHERE id = $14"#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.map(|id| id.into_uuid()))
        .bind(product.price_usd.minor_units())
        .bind(product.cost_usd.minor_units())
        .bind(product.stock_min)
        .bind(product.stock_max)
        .bind(&product.barcode)
        .bind(&product.image_url)
        .bind(product.active)
        .bind(product.cached_price_local.minor_units())
        .bind(product.cached_rate.value())
        .bind(product.updated_at)
        .bind(product.id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row: Option<DbProduct> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
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
        let delta = movement.quantity;

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!(
            "UPDATE products SET stock = stock + $1, updated_at = $2 \
             WHERE id = $3 AND stock + $1 >= 0 RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<DbProduct> = sqlx::query_as(&sql)
            .bind(delta)
            .bind(Utc::now())
            .bind(id.into_uuid())
            .fetch_optional(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            let current: Option<DbStock> =
                sqlx::query_as(r#"SELECT stock FROM products WHERE id = $1"#)
                    .bind(id.into_uuid())
                    .fetch_optional(&mut *db_tx)
                    .await
                    .map_err(|e| RepoError::Database(e.to_string()))?;

            let current = current.ok_or(RepoError::NotFound)?;
            return Err(RepoError::Domain(DomainError::InsufficientStock {
                product_id: id,
                available: current.stock,
                requested: -delta,
            }));
        };

        sqlx::query(
            r#"INSERT INTO stock_movements (id, product_id, quantity, kind, notes, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(movement.id.into_uuid())
        .bind(id.into_uuid())
        .bind(delta)
        .bind(movement.kind.as_str())
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| map_insert_error(e, "Stock movement"))?;

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
        let rows: Vec<DbMovement> = sqlx::query_as(
            r#"SELECT id, product_id, quantity, kind, notes, created_at FROM stock_movements
               WHERE $1::uuid IS NULL OR product_id = $1
               ORDER BY created_at DESC LIMIT $2"#,
        )
        .bind(product_id.map(|id| id.into_uuid()))
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

        // Row locks keep concurrent price edits from interleaving with the repricing.
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products FOR UPDATE");
        let rows: Vec<DbProduct> = sqlx::query_as(&sql)
            .fetch_all(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let now = Utc::now();
        let mut touched = 0;
        for row in rows {
            let product = row.into_domain()?;
            let result = sqlx::query(
                r#"UPDATE products SET cached_price_local = $1, cached_rate = $2, updated_at = $3
                   WHERE id = $4"#,
            )
            .bind(product.price_local(rate).minor_units())
            .bind(rate.value())
            .bind(now)
            .bind(product.id.into_uuid())
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
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!(
            "INSERT INTO sales ({SALE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&sql)
            .bind(sale.id.into_uuid())
            .bind(sale.customer_id.map(|id| id.into_uuid()))
            .bind(&sale.customer)
            .bind(&sale.payment_method)
            .bind(&sale.notes)
            .bind(sale.discount_usd.minor_units())
            .bind(sale.rate.value())
            .bind(sale.status.as_str())
            .bind(sale.created_at)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| map_insert_error(e, "Sale"))?;

        for (position, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO sale_lines (sale_id, position, product_id, quantity, unit_price_usd)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(sale.id.into_uuid())
            .bind(position as i32)
            .bind(line.product_id.into_uuid())
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
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1");
        let row: Option<DbSale> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self
            .fetch_lines("sale_lines", "sale_id", Some(id.into_uuid()))
            .await?;
        row.into_domain(lines.into_iter().map(|(_, line)| line).collect())
            .map(Some)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>, RepoError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC");
        let rows: Vec<DbSale> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut lines = group_lines(self.fetch_lines("sale_lines", "sale_id", None).await?);
        rows.into_iter()
            .map(|row| {
                let lines = lines.remove(&row.id).unwrap_or_default();
                row.into_domain(lines)
            })
            .collect()
    }

    async fn update_sale_status(&self, id: SaleId, status: SaleStatus) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE sales SET status = $1 WHERE id = $2"#)
            .bind(status.as_str())
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let sql = format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&sql)
            .bind(order.id.into_uuid())
            .bind(order.supplier_id.into_uuid())
            .bind(order.status.as_str())
            .bind(order.priority.as_str())
            .bind(&order.notes)
            .bind(order.expected_delivery)
            .bind(order.rate.map(|r| r.value()))
            .bind(order.created_at)
            .bind(order.received_at)
            .bind(order.paid_at)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| map_insert_error(e, "Order"))?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO order_lines (order_id, position, product_id, quantity, unit_price_usd)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(order.id.into_uuid())
            .bind(position as i32)
            .bind(line.product_id.into_uuid())
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
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row: Option<DbOrder> = sqlx::query_as(&sql)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = self
            .fetch_lines("order_lines", "order_id", Some(id.into_uuid()))
            .await?;
        row.into_domain(lines.into_iter().map(|(_, line)| line).collect())
            .map(Some)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows: Vec<DbOrder> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut lines = group_lines(self.fetch_lines("order_lines", "order_id", None).await?);
        rows.into_iter()
            .map(|row| {
                let lines = lines.remove(&row.id).unwrap_or_default();
                row.into_domain(lines)
            })
            .collect()
    }

    async fn update_order(&self, order: &Order) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE orders SET status = $1, priority = $2, notes = $3, rate = $4,
                   received_at = $5, paid_at = $6
               WHERE id = $7"#,
        )
        .bind(order.status.as_str())
        .bind(order.priority.as_str())
        .bind(&order.notes)
        .bind(order.rate.map(|r| r.value()))
        .bind(order.received_at)
        .bind(order.paid_at)
        .bind(order.id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
