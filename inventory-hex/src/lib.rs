//! # Inventory Hex
//!
//! Application services and adapters for the inventory service.
//!
//! ## Architecture
//!
//! - `rates` - Exchange rate service (in-memory rate, refresh, fallback)
//! - `service` - Inventory service (catalog, sales, purchase orders, reports)
//! - `scheduler` / `propagation` - Background refresh and price cache tasks
//! - `inbound/` - HTTP adapter (Axum server)
//! - `outbound/` - HTTP client for the external rate source
//!
//! Services are generic over the port traits, allowing different
//! repository and rate source implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod propagation;
pub mod rates;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod mocks;
#[cfg(test)]
mod service_tests;

pub use propagation::PriceCacheUpdater;
pub use rates::{BackoffPolicy, RateService};
pub use scheduler::{RefreshScheduler, ScheduleConfig, TaskHandle};
pub use service::InventoryService;
