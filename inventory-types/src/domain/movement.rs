//! Stock movement ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity_id;
use super::product::ProductId;
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for a StockMovement.
    StockMovementId
}

/// What caused a change of stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[default]
    Adjustment,
    Sale,
    SaleCancellation,
    Purchase,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Adjustment => "adjustment",
            MovementKind::Sale => "sale",
            MovementKind::SaleCancellation => "sale_cancellation",
            MovementKind::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adjustment" => Ok(MovementKind::Adjustment),
            "sale" => Ok(MovementKind::Sale),
            "sale_cancellation" => Ok(MovementKind::SaleCancellation),
            "purchase" => Ok(MovementKind::Purchase),
            other => Err(format!("Unknown movement kind: {}", other)),
        }
    }
}

/// One signed change of a product's stock.
///
/// Written in the same transaction as the stock update it describes, so the
/// ledger for a product sums to its stock on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub product_id: ProductId,
    /// Positive for goods in, negative for goods out
    #[schema(example = -2)]
    pub quantity: i32,
    pub kind: MovementKind,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        product_id: ProductId,
        quantity: i32,
        kind: MovementKind,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::ValidationError(
                "Stock movement cannot be zero".into(),
            ));
        }

        Ok(Self {
            id: StockMovementId::new(),
            product_id,
            quantity,
            kind,
            notes,
            created_at: Utc::now(),
        })
    }

    /// A hand-made correction, noted as `Manual stock adjustment: +N`.
    pub fn adjustment(
        product_id: ProductId,
        delta: i32,
        reason: Option<&str>,
    ) -> Result<Self, DomainError> {
        let mut notes = format!("Manual stock adjustment: {:+}", delta);
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            notes.push_str(" (");
            notes.push_str(reason);
            notes.push(')');
        }
        Self::new(product_id, delta, MovementKind::Adjustment, Some(notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_movement_rejected() {
        let result = StockMovement::new(ProductId::new(), 0, MovementKind::Sale, None);
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_adjustment_notes_carry_sign_and_reason() {
        let up = StockMovement::adjustment(ProductId::new(), 5, None).unwrap();
        assert_eq!(up.notes.as_deref(), Some("Manual stock adjustment: +5"));
        assert_eq!(up.kind, MovementKind::Adjustment);

        let down = StockMovement::adjustment(ProductId::new(), -2, Some("merma")).unwrap();
        assert_eq!(
            down.notes.as_deref(),
            Some("Manual stock adjustment: -2 (merma)")
        );
        assert_eq!(down.quantity, -2);
    }

    #[test]
    fn test_kind_parses_its_own_names() {
        for kind in [
            MovementKind::Adjustment,
            MovementKind::Sale,
            MovementKind::SaleCancellation,
            MovementKind::Purchase,
        ] {
            assert_eq!(kind.as_str().parse::<MovementKind>(), Ok(kind));
        }
        assert!("transfer".parse::<MovementKind>().is_err());
    }
}
