//! Outbound adapters for ports the hex crate owns an implementation of.

pub mod http_rate_source;

pub use http_rate_source::{DEFAULT_RATE_POINTER, DEFAULT_RATE_SOURCE_URL, HttpRateSource};
