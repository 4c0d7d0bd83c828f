//! # Inventory Types
//!
//! Domain types and port traits for the inventory, sales and purchasing
//! service. This crate has ZERO external IO dependencies - only data
//! structures, business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (rate records, products, stock movements,
//!   customers, sales, orders)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Request types for API boundaries
//! - `views/` - Dual-currency read models (live vs. frozen conversion)
//! - `error/` - Domain, rate and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod views;

// Re-export commonly used types
pub use domain::{
    Category, CategoryId, CurrentRate, Customer, CustomerId, LineItem, MovementKind, Order,
    OrderId, OrderPriority, OrderStatus, Product, ProductId, RateId, RateRecord, RateSource, Sale,
    SaleId, SaleStatus, StockMovement, StockMovementId, Supplier, SupplierId,
};
pub use dto::*;
pub use error::{AppError, DomainError, RateError, RepoError};
pub use exchange_rates::{CurrencyCode, InvalidRate, Money, Rate, USD, VES};
pub use ports::{ExternalRateSource, InventoryRepository, RateHistoryRepository};
pub use views::{InventorySummary, OrderView, PricedLine, ProductView, SaleQuote, SaleView};
