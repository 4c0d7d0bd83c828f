//! Product domain model.

use chrono::{DateTime, Utc};
use exchange_rates::{Money, Rate, USD, VES};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::CategoryId;
use super::entity_id;
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for a Product.
    ProductId
}

pub const DEFAULT_STOCK_MIN: i32 = 10;
pub const DEFAULT_STOCK_MAX: i32 = 100;

/// A product for sale.
///
/// `price_usd` is the source of truth. `cached_price_local` and
/// `cached_rate` hold the conversion made at the last write or rate change;
/// they are a display cache and never used for totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: Option<CategoryId>,
    #[schema(value_type = i64, example = 1000)]
    pub price_usd: Money<USD>,
    #[schema(value_type = i64, example = 600)]
    pub cost_usd: Money<USD>,
    pub stock: i32,
    pub stock_min: i32,
    pub stock_max: i32,
    pub barcode: String,
    pub image_url: String,
    pub active: bool,
    #[schema(value_type = i64, example = 36500)]
    pub cached_price_local: Money<VES>,
    #[schema(value_type = f64, example = 36.5)]
    pub cached_rate: Rate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with no stock, priced at `rate`.
    pub fn new(name: String, price_usd: Money<USD>, rate: Rate) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name,
            description: String::new(),
            category_id: None,
            price_usd,
            cost_usd: Money::default(),
            stock: 0,
            stock_min: DEFAULT_STOCK_MIN,
            stock_max: DEFAULT_STOCK_MAX,
            barcode: String::new(),
            image_url: String::new(),
            active: true,
            cached_price_local: exchange_rates::to_local(price_usd, rate),
            cached_rate: rate,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the invariants a product must hold before it is stored.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Product name cannot be empty".into(),
            ));
        }
        if self.price_usd.is_negative() || self.cost_usd.is_negative() {
            return Err(DomainError::NegativeAmount);
        }
        if self.stock < 0 {
            return Err(DomainError::ValidationError(
                "Stock cannot be negative".into(),
            ));
        }
        if self.stock_min < 0 || self.stock_min > self.stock_max {
            return Err(DomainError::ValidationError(format!(
                "Invalid stock bounds: min {} max {}",
                self.stock_min, self.stock_max
            )));
        }
        Ok(())
    }

    /// Local price at the given rate, computed on read.
    pub fn price_local(&self, rate: Rate) -> Money<VES> {
        exchange_rates::to_local(self.price_usd, rate)
    }

    /// Refreshes the cached local price.
    pub fn reprice(&mut self, rate: Rate) {
        self.cached_price_local = self.price_local(rate);
        self.cached_rate = rate;
        self.updated_at = Utc::now();
    }

    /// Applies a stock movement, refusing to go below zero.
    pub fn apply_stock_delta(&mut self, delta: i32) -> Result<(), DomainError> {
        let next = self.stock.checked_add(delta).ok_or_else(|| {
            DomainError::ValidationError("Stock adjustment overflows".into())
        })?;
        if next < 0 {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested: -delta,
            });
        }
        self.stock = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock < self.stock_min
    }

    /// Value of the stock on hand at the USD price.
    pub fn stock_value_usd(&self) -> Money<USD> {
        self.price_usd.times(self.stock as i64)
    }
}
