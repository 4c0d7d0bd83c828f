//! Error types for the inventory service.

use exchange_rates::InvalidRate;

use crate::domain::ProductId;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: i32,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error(transparent)]
    InvalidRate(#[from] InvalidRate),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    /// A stored rate failed validation on read-back. This is a configuration
    /// fault and must never reach a conversion.
    #[error("Corrupt exchange rate in store: {0}")]
    CorruptRate(String),
}

/// Exchange rate acquisition errors.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Rate source unreachable: {0}")]
    Network(String),

    #[error("Malformed rate payload: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    InvalidRate(#[from] InvalidRate),

    #[error("Rate store error: {0}")]
    Store(#[from] RepoError),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock { .. } | DomainError::InvalidStatusTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::CorruptRate(e) => AppError::Internal(e),
        }
    }
}

impl From<RateError> for AppError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::InvalidRate(e) => AppError::BadRequest(e.to_string()),
            RateError::Store(e) => e.into(),
            e => AppError::Internal(e.to_string()),
        }
    }
}
