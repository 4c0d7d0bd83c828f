//! External exchange rate source port.
//!
//! Implementations can be HTTP clients, fixed test providers, etc.

use exchange_rates::Rate;

use crate::error::RateError;

/// Port trait for the upstream USD → local rate feed.
#[async_trait::async_trait]
pub trait ExternalRateSource: Send + Sync + 'static {
    /// Fetches the latest published rate.
    ///
    /// Implementations must return `RateError::InvalidRate` rather than a
    /// zero, negative or non-finite value.
    async fn fetch_rate(&self) -> Result<Rate, RateError>;

    /// Short label used in logs.
    fn name(&self) -> &str;
}
