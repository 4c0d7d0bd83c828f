//! Customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::{check_email, require_name};
use super::entity_id;
use crate::error::DomainError;

entity_id! {
    /// Unique identifier for a Customer.
    CustomerId
}

/// A registered customer sales can be attributed to.
///
/// Deleting a customer only deactivates it, so past sales keep their link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// National ID or tax number
    #[schema(example = "V-12345678")]
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String) -> Result<Self, DomainError> {
        let customer = Self {
            id: CustomerId::new(),
            name,
            document_id: None,
            phone: None,
            email: None,
            address: None,
            active: true,
            created_at: Utc::now(),
        };
        customer.validate()?;
        Ok(customer)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require_name("Customer", &self.name)?;
        check_email("customer", self.email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer_is_active() {
        let customer = Customer::new("María Pérez".into()).unwrap();
        assert!(customer.active);
        assert!(customer.document_id.is_none());
    }

    #[test]
    fn test_customer_validation() {
        assert!(Customer::new(" ".into()).is_err());

        let mut customer = Customer::new("María Pérez".into()).unwrap();
        customer.email = Some("maria.example.com".into());
        assert!(matches!(
            customer.validate(),
            Err(DomainError::ValidationError(_))
        ));
    }
}
