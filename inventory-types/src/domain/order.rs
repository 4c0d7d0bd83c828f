//! Purchase order ("encargo") domain model.

use chrono::{DateTime, NaiveDate, Utc};
use exchange_rates::{Money, Rate, USD, VES};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::SupplierId;
use super::entity_id;
use super::line::{LineItem, lines_total_usd, require_lines};
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for an Order.
    OrderId
}

/// Lifecycle of a purchase order.
///
/// ```text
/// pending ──► received ──► paid_received
///    │  └──────────────────────▲
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Received,
    PaidReceived,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Received => "received",
            OrderStatus::PaidReceived => "paid_received",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the order's goods have arrived; finalized orders carry a
    /// frozen rate.
    pub fn is_finalized(&self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::PaidReceived)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Received) | (Pending, PaidReceived) | (Pending, Cancelled) | (Received, PaidReceived)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "received" => Ok(OrderStatus::Received),
            "paid_received" => Ok(OrderStatus::PaidReceived),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Urgency of a purchase order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl OrderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPriority::Low => "low",
            OrderPriority::Normal => "normal",
            OrderPriority::High => "high",
            OrderPriority::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for OrderPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(OrderPriority::Low),
            "normal" => Ok(OrderPriority::Normal),
            "high" => Ok(OrderPriority::High),
            "urgent" => Ok(OrderPriority::Urgent),
            other => Err(format!("Unknown order priority: {}", other)),
        }
    }
}

/// A purchase order placed with a supplier.
///
/// While pending, the order has no rate of its own and its local totals
/// follow the current rate. Finalizing it (received or paid) freezes the
/// rate in force at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: OrderId,
    pub supplier_id: SupplierId,
    pub lines: Vec<LineItem>,
    pub status: OrderStatus,
    pub priority: OrderPriority,
    pub notes: Option<String>,
    pub expected_delivery: Option<NaiveDate>,
    /// Rate frozen at finalization
    #[schema(value_type = Option<f64>)]
    pub rate: Option<Rate>,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a pending order.
    pub fn pending(
        supplier_id: SupplierId,
        lines: Vec<LineItem>,
        priority: OrderPriority,
        notes: Option<String>,
        expected_delivery: Option<NaiveDate>,
    ) -> Result<Self, DomainError> {
        require_lines(&lines)?;

        Ok(Self {
            id: OrderId::new(),
            supplier_id,
            lines,
            status: OrderStatus::Pending,
            priority,
            notes,
            expected_delivery,
            rate: None,
            created_at: Utc::now(),
            received_at: None,
            paid_at: None,
        })
    }

    pub fn total_usd(&self) -> Money<USD> {
        lines_total_usd(&self.lines)
    }

    /// The rate local figures are shown at: the frozen one when finalized,
    /// otherwise `current`.
    pub fn effective_rate(&self, current: Rate) -> Rate {
        self.rate.unwrap_or(current)
    }

    pub fn total_local(&self, current: Rate) -> Money<VES> {
        exchange_rates::to_local(self.total_usd(), self.effective_rate(current))
    }

    /// Moves the order to `next`, freezing `current` the first time the
    /// order becomes finalized.
    pub fn transition(&mut self, next: OrderStatus, current: Rate) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        let now = Utc::now();
        if next.is_finalized() && self.rate.is_none() {
            self.rate = Some(current);
        }
        if next.is_finalized() && self.received_at.is_none() {
            self.received_at = Some(now);
        }
        if next == OrderStatus::PaidReceived {
            self.paid_at = Some(now);
        }
        self.status = next;
        Ok(())
    }
}
