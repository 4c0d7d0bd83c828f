//! Exchange rate history domain model.

use chrono::{DateTime, Utc};
use exchange_rates::Rate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity_id;

entity_id! {
    /// Unique identifier for a rate history record.
    RateId
}

/// Where a rate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Fetched from the external rate source
    Api,
    /// Entered by a user
    Manual,
    /// Read back from history or the built-in default after a failed fetch
    Fallback,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::Api => "api",
            RateSource::Manual => "manual",
            RateSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(RateSource::Api),
            "manual" => Ok(RateSource::Manual),
            "fallback" => Ok(RateSource::Fallback),
            other => Err(format!("Unknown rate source: {}", other)),
        }
    }
}

/// A persisted exchange rate observation.
///
/// History is append-only: a record is never edited except for `active`
/// being cleared once a newer record supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateRecord {
    pub id: RateId,
    /// Local-currency units per US dollar
    #[schema(value_type = f64, example = 36.5)]
    pub rate: Rate,
    pub source: RateSource,
    /// Whether this is the rate currently in force
    pub active: bool,
    pub observed_at: DateTime<Utc>,
}

impl RateRecord {
    /// Creates a new active record observed now.
    pub fn new(rate: Rate, source: RateSource) -> Self {
        Self {
            id: RateId::new(),
            rate,
            source,
            active: true,
            observed_at: Utc::now(),
        }
    }

    /// Reconstructs a record from database fields.
    pub fn from_parts(
        id: RateId,
        rate: Rate,
        source: RateSource,
        active: bool,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            rate,
            source,
            active,
            observed_at,
        }
    }
}

/// The rate held in memory and shown to every priced view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentRate {
    #[schema(value_type = f64, example = 36.5)]
    pub rate: Rate,
    pub source: RateSource,
    pub observed_at: DateTime<Utc>,
}

impl CurrentRate {
    /// The value used before any rate has been established.
    pub fn initial(rate: Rate) -> Self {
        Self {
            rate,
            source: RateSource::Fallback,
            observed_at: Utc::now(),
        }
    }
}

impl From<&RateRecord> for CurrentRate {
    fn from(record: &RateRecord) -> Self {
        Self {
            rate: record.rate,
            source: record.source,
            observed_at: record.observed_at,
        }
    }
}
