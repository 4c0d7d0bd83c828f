//! Domain models for the inventory service.

/// Declares a UUID-backed identifier newtype.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Returns the UUID value.
            pub fn into_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

pub(crate) use entity_id;

pub mod catalog;
pub mod customer;
pub mod line;
pub mod movement;
pub mod order;
pub mod product;
pub mod rate;
pub mod sale;

pub use catalog::{Category, CategoryId, Supplier, SupplierId};
pub use customer::{Customer, CustomerId};
pub use line::LineItem;
pub use movement::{MovementKind, StockMovement, StockMovementId};
pub use order::{Order, OrderId, OrderPriority, OrderStatus};
pub use product::{Product, ProductId};
pub use rate::{CurrentRate, RateId, RateRecord, RateSource};
pub use sale::{Sale, SaleId, SaleStatus};
