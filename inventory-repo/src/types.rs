//! Shared database row types for SQLite and PostgreSQL.
//!
//! SQLite stores identifiers and timestamps as TEXT while PostgreSQL uses
//! native UUID and TIMESTAMPTZ columns. The row structs are declared once by
//! `db_rows!` and instantiated per backend; the column representations are
//! decoded through [`DbUuid`] and [`DbTimestamp`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use inventory_types::{LineItem, Rate, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Column conversions
// ─────────────────────────────────────────────────────────────────────────────

pub trait DbUuid {
    fn to_uuid(self) -> Result<Uuid, RepoError>;
}

impl DbUuid for Uuid {
    fn to_uuid(self) -> Result<Uuid, RepoError> {
        Ok(self)
    }
}

impl DbUuid for String {
    fn to_uuid(self) -> Result<Uuid, RepoError> {
        Uuid::parse_str(&self).map_err(|e| RepoError::Database(e.to_string()))
    }
}

pub trait DbTimestamp {
    fn to_utc(self) -> Result<DateTime<Utc>, RepoError>;
}

impl DbTimestamp for DateTime<Utc> {
    fn to_utc(self) -> Result<DateTime<Utc>, RepoError> {
        Ok(self)
    }
}

impl DbTimestamp for String {
    fn to_utc(self) -> Result<DateTime<Utc>, RepoError> {
        DateTime::parse_from_rfc3339(&self)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

/// Fixed-width RFC 3339 so TEXT timestamps sort chronologically.
#[cfg(feature = "sqlite")]
pub fn timestamp_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// A stored rate that fails validation is never handed to a conversion.
pub fn parse_rate(value: f64) -> Result<Rate, RepoError> {
    Rate::new(value).map_err(|e| RepoError::CorruptRate(e.to_string()))
}

pub fn parse_enum<T>(value: &str) -> Result<T, RepoError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(RepoError::Database)
}

/// Groups line rows under their parent id, preserving row order.
pub fn group_lines(rows: Vec<(Uuid, LineItem)>) -> HashMap<Uuid, Vec<LineItem>> {
    let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    for (parent, line) in rows {
        grouped.entry(parent).or_default().push(line);
    }
    grouped
}

// ─────────────────────────────────────────────────────────────────────────────
// Row structs
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! db_rows {
    ($id:ty, $ts:ty) => {
        use inventory_types::{
            Category, CategoryId, Customer, CustomerId, LineItem, Money, Order, OrderId, Product,
            ProductId, RateId, RateRecord, RepoError, Sale, SaleId, StockMovement,
            StockMovementId, Supplier, SupplierId,
        };
        use sqlx::FromRow;

        use crate::types::{DbTimestamp, DbUuid, parse_enum, parse_rate};

        /// Exchange rate history row.
        #[derive(FromRow)]
        pub struct DbRate {
            pub id: $id,
            pub rate: f64,
            pub source: String,
            pub active: bool,
            pub observed_at: $ts,
        }

        impl DbRate {
            pub fn into_domain(self) -> Result<RateRecord, RepoError> {
                Ok(RateRecord::from_parts(
                    RateId::from_uuid(self.id.to_uuid()?),
                    parse_rate(self.rate)?,
                    parse_enum(&self.source)?,
                    self.active,
                    self.observed_at.to_utc()?,
                ))
            }
        }

        #[derive(FromRow)]
        pub struct DbCategory {
            pub id: $id,
            pub name: String,
            pub description: String,
            pub icon: String,
        }

        impl DbCategory {
            pub fn into_domain(self) -> Result<Category, RepoError> {
                Ok(Category {
                    id: CategoryId::from_uuid(self.id.to_uuid()?),
                    name: self.name,
                    description: self.description,
                    icon: self.icon,
                })
            }
        }

        #[derive(FromRow)]
        pub struct DbSupplier {
            pub id: $id,
            pub name: String,
            pub phone: Option<String>,
            pub email: Option<String>,
            pub address: Option<String>,
            pub active: bool,
            pub created_at: $ts,
        }

        impl DbSupplier {
            pub fn into_domain(self) -> Result<Supplier, RepoError> {
                Ok(Supplier {
                    id: SupplierId::from_uuid(self.id.to_uuid()?),
                    name: self.name,
                    phone: self.phone,
                    email: self.email,
                    address: self.address,
                    active: self.active,
                    created_at: self.created_at.to_utc()?,
                })
            }
        }

        #[derive(FromRow)]
        pub struct DbCustomer {
            pub id: $id,
            pub name: String,
            pub document_id: Option<String>,
            pub phone: Option<String>,
            pub email: Option<String>,
            pub address: Option<String>,
            pub active: bool,
            pub created_at: $ts,
        }

        impl DbCustomer {
            pub fn into_domain(self) -> Result<Customer, RepoError> {
                Ok(Customer {
                    id: CustomerId::from_uuid(self.id.to_uuid()?),
                    name: self.name,
                    document_id: self.document_id,
                    phone: self.phone,
                    email: self.email,
                    address: self.address,
                    active: self.active,
                    created_at: self.created_at.to_utc()?,
                })
            }
        }

        /// Product row from database.
        #[derive(FromRow)]
        pub struct DbProduct {
            pub id: $id,
            pub name: String,
            pub description: String,
            pub category_id: Option<$id>,
            pub price_usd: i64,
            pub cost_usd: i64,
            pub stock: i32,
            pub stock_min: i32,
            pub stock_max: i32,
            pub barcode: String,
            pub image_url: String,
            pub active: bool,
            pub cached_price_local: i64,
            pub cached_rate: f64,
            pub created_at: $ts,
            pub updated_at: $ts,
        }

        impl DbProduct {
            pub fn into_domain(self) -> Result<Product, RepoError> {
                Ok(Product {
                    id: ProductId::from_uuid(self.id.to_uuid()?),
                    name: self.name,
                    description: self.description,
                    category_id: self
                        .category_id
                        .map(DbUuid::to_uuid)
                        .transpose()?
                        .map(CategoryId::from_uuid),
                    price_usd: Money::from_minor(self.price_usd),
                    cost_usd: Money::from_minor(self.cost_usd),
                    stock: self.stock,
                    stock_min: self.stock_min,
                    stock_max: self.stock_max,
                    barcode: self.barcode,
                    image_url: self.image_url,
                    active: self.active,
                    cached_price_local: Money::from_minor(self.cached_price_local),
                    cached_rate: parse_rate(self.cached_rate)?,
                    created_at: self.created_at.to_utc()?,
                    updated_at: self.updated_at.to_utc()?,
                })
            }
        }

        /// Stock ledger row.
        #[derive(FromRow)]
        pub struct DbMovement {
            pub id: $id,
            pub product_id: $id,
            pub quantity: i32,
            pub kind: String,
            pub notes: Option<String>,
            pub created_at: $ts,
        }

        impl DbMovement {
            pub fn into_domain(self) -> Result<StockMovement, RepoError> {
                Ok(StockMovement {
                    id: StockMovementId::from_uuid(self.id.to_uuid()?),
                    product_id: ProductId::from_uuid(self.product_id.to_uuid()?),
                    quantity: self.quantity,
                    kind: parse_enum(&self.kind)?,
                    notes: self.notes,
                    created_at: self.created_at.to_utc()?,
                })
            }
        }

        /// One line of a sale or order. `parent_id` is the owning record.
        #[derive(FromRow)]
        pub struct DbLine {
            pub parent_id: $id,
            pub product_id: $id,
            pub quantity: i32,
            pub unit_price_usd: i64,
        }

        impl DbLine {
            pub fn into_domain(self) -> Result<(uuid::Uuid, LineItem), RepoError> {
                let line = LineItem {
                    product_id: ProductId::from_uuid(self.product_id.to_uuid()?),
                    quantity: self.quantity,
                    unit_price_usd: Money::from_minor(self.unit_price_usd),
                };
                Ok((self.parent_id.to_uuid()?, line))
            }
        }

        #[derive(FromRow)]
        pub struct DbSale {
            pub id: $id,
            pub customer_id: Option<$id>,
            pub customer: Option<String>,
            pub payment_method: String,
            pub notes: Option<String>,
            pub discount_usd: i64,
            pub rate: f64,
            pub status: String,
            pub created_at: $ts,
        }

        impl DbSale {
            pub fn into_domain(self, lines: Vec<LineItem>) -> Result<Sale, RepoError> {
                Ok(Sale {
                    id: SaleId::from_uuid(self.id.to_uuid()?),
                    customer_id: self
                        .customer_id
                        .map(DbUuid::to_uuid)
                        .transpose()?
                        .map(CustomerId::from_uuid),
                    customer: self.customer,
                    payment_method: self.payment_method,
                    notes: self.notes,
                    lines,
                    discount_usd: Money::from_minor(self.discount_usd),
                    rate: parse_rate(self.rate)?,
                    status: parse_enum(&self.status)?,
                    created_at: self.created_at.to_utc()?,
                })
            }
        }

        #[derive(FromRow)]
        pub struct DbOrder {
            pub id: $id,
            pub supplier_id: $id,
            pub status: String,
            pub priority: String,
            pub notes: Option<String>,
            pub expected_delivery: Option<chrono::NaiveDate>,
            pub rate: Option<f64>,
            pub created_at: $ts,
            pub received_at: Option<$ts>,
            pub paid_at: Option<$ts>,
        }

        impl DbOrder {
            pub fn into_domain(self, lines: Vec<LineItem>) -> Result<Order, RepoError> {
                Ok(Order {
                    id: OrderId::from_uuid(self.id.to_uuid()?),
                    supplier_id: SupplierId::from_uuid(self.supplier_id.to_uuid()?),
                    lines,
                    status: parse_enum(&self.status)?,
                    priority: parse_enum(&self.priority)?,
                    notes: self.notes,
                    expected_delivery: self.expected_delivery,
                    rate: self.rate.map(parse_rate).transpose()?,
                    created_at: self.created_at.to_utc()?,
                    received_at: self.received_at.map(DbTimestamp::to_utc).transpose()?,
                    paid_at: self.paid_at.map(DbTimestamp::to_utc).transpose()?,
                })
            }
        }

        /// Stock-only row for conflict reporting.
        #[derive(FromRow)]
        pub struct DbStock {
            pub stock: i32,
        }
    };
}

/// Rows with TEXT identifiers and timestamps.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    db_rows!(String, String);
}

/// Rows with native UUID and TIMESTAMPTZ columns.
#[cfg(feature = "postgres")]
pub mod postgres {
    db_rows!(uuid::Uuid, chrono::DateTime<chrono::Utc>);
}

