//! Checkout error types.

use document_store::StoreError;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while creating an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request broke a business rule, or a repository failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The document store failed outside of a repository call.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true if the error was caused by the request rather than by
    /// the infrastructure.
    pub fn is_client_error(&self) -> bool {
        match self {
            CheckoutError::Domain(e) => e.is_client_error(),
            CheckoutError::Store(_) => false,
        }
    }

    /// Returns true if the store rejected a transaction it cannot run.
    pub fn is_transaction_unsupported(&self) -> bool {
        match self {
            CheckoutError::Domain(e) => e.is_transaction_unsupported(),
            CheckoutError::Store(e) => e.is_transaction_unsupported(),
        }
    }

    /// Returns a short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Domain(DomainError::Validation { .. }) => "validation",
            CheckoutError::Domain(DomainError::ProductsNotFound) => "products_not_found",
            CheckoutError::Domain(DomainError::LineProductNotFound { .. }) => {
                "line_product_not_found"
            }
            CheckoutError::Domain(DomainError::VariantNotFound { .. }) => "variant_not_found",
            CheckoutError::Domain(DomainError::InsufficientStock { .. }) => "insufficient_stock",
            CheckoutError::Domain(DomainError::Store(StoreError::DuplicateKey { .. }))
            | CheckoutError::Store(StoreError::DuplicateKey { .. }) => "duplicate_key",
            CheckoutError::Domain(DomainError::Store(_)) | CheckoutError::Store(_) => "store",
            CheckoutError::Domain(_) => "other",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
