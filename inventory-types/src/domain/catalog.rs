//! Categories and suppliers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity_id;
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for a Category.
    CategoryId
}

entity_id! {
    /// Unique identifier for a Supplier.
    SupplierId
}

const DEFAULT_CATEGORY_ICON: &str = "📦";

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl Category {
    pub fn new(
        name: String,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<Self, DomainError> {
        let category = Self {
            id: CategoryId::new(),
            name,
            description: description.unwrap_or_default(),
            icon: icon.unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        };
        category.validate()?;
        Ok(category)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require_name("Category", &self.name)
    }
}

/// A supplier purchase orders are placed with.
///
/// Suppliers are never deleted: past orders keep pointing at them.
/// Deactivated suppliers drop out of the listing and take no new orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(
        name: String,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<Self, DomainError> {
        let supplier = Self {
            id: SupplierId::new(),
            name,
            phone,
            email,
            address: None,
            active: true,
            created_at: Utc::now(),
        };
        supplier.validate()?;
        Ok(supplier)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require_name("Supplier", &self.name)?;
        check_email("supplier", self.email.as_deref())
    }
}

pub(crate) fn require_name(what: &str, name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::ValidationError(format!(
            "{} name cannot be empty",
            what
        )));
    }
    Ok(())
}

/// Only checks for an `@`.
pub(crate) fn check_email(what: &str, email: Option<&str>) -> Result<(), DomainError> {
    match email {
        Some(email) if !email.contains('@') => Err(DomainError::ValidationError(format!(
            "Invalid {} email: {}",
            what, email
        ))),
        _ => Ok(()),
    }
}
