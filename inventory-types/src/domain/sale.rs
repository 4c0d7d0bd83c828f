//! Sale domain model.

use chrono::{DateTime, Utc};
use exchange_rates::{Money, Rate, USD, VES};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::customer::CustomerId;
use super::entity_id;
use super::line::{LineItem, lines_total_usd, require_lines};
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for a Sale.
    SaleId
}

pub const DEFAULT_PAYMENT_METHOD: &str = "Efectivo";

/// Lifecycle of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(format!("Unknown sale status: {}", other)),
        }
    }
}

/// A completed sale.
///
/// Sales are finalized when created: `rate` is the exchange rate in force at
/// that moment and every local-currency figure of the sale derives from it,
/// whatever the current rate is later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    pub id: SaleId,
    /// Registered customer, when the sale was attributed to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub customer: Option<String>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub lines: Vec<LineItem>,
    #[schema(value_type = i64)]
    pub discount_usd: Money<USD>,
    #[schema(value_type = f64, example = 36.5)]
    pub rate: Rate,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Creates a completed sale frozen at `rate`.
    pub fn complete(
        lines: Vec<LineItem>,
        discount_usd: Money<USD>,
        rate: Rate,
        customer: Option<String>,
        payment_method: Option<String>,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        require_lines(&lines)?;
        if discount_usd.is_negative() {
            return Err(DomainError::NegativeAmount);
        }
        if discount_usd > lines_total_usd(&lines) {
            return Err(DomainError::ValidationError(
                "Discount cannot exceed the sale subtotal".into(),
            ));
        }

        Ok(Self {
            id: SaleId::new(),
            customer_id: None,
            customer,
            payment_method: payment_method.unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            notes,
            lines,
            discount_usd,
            rate,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
        })
    }

    /// Sum of line subtotals before discount.
    pub fn subtotal_usd(&self) -> Money<USD> {
        lines_total_usd(&self.lines)
    }

    pub fn total_usd(&self) -> Money<USD> {
        self.subtotal_usd() - self.discount_usd
    }

    /// Total in local currency at the rate frozen on the sale.
    pub fn total_local(&self) -> Money<VES> {
        exchange_rates::to_local(self.total_usd(), self.rate)
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == SaleStatus::Cancelled {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: SaleStatus::Cancelled.to_string(),
            });
        }
        self.status = SaleStatus::Cancelled;
        Ok(())
    }
}
