//! Line items shared by sales and purchase orders.

use exchange_rates::{Money, USD};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::product::ProductId;
use crate::error::DomainError;

/// A quantity of one product at a USD unit price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price in cents
    #[schema(value_type = i64, example = 1000)]
    pub unit_price_usd: Money<USD>,
}

impl LineItem {
    pub fn new(
        product_id: ProductId,
        quantity: i32,
        unit_price_usd: Money<USD>,
    ) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::ValidationError(
                "Quantity must be positive".into(),
            ));
        }
        if unit_price_usd.is_negative() {
            return Err(DomainError::NegativeAmount);
        }

        Ok(Self {
            product_id,
            quantity,
            unit_price_usd,
        })
    }

    pub fn subtotal_usd(&self) -> Money<USD> {
        self.unit_price_usd.times(self.quantity as i64)
    }
}

/// Sums the USD subtotals of a set of lines.
pub fn lines_total_usd(lines: &[LineItem]) -> Money<USD> {
    lines.iter().map(LineItem::subtotal_usd).sum()
}

/// Rejects an empty set of lines.
pub(crate) fn require_lines(lines: &[LineItem]) -> Result<(), DomainError> {
    if lines.is_empty() {
        return Err(DomainError::ValidationError(
            "At least one line item is required".into(),
        ));
    }
    Ok(())
}
