//! Domain error types.

use document_store::StoreError;
use thiserror::Error;

use crate::order::OrderStatus;
use crate::voucher::VoucherRejection;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required checkout field is missing or malformed.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// None of the requested products exist.
    #[error("No products found for the requested items")]
    ProductsNotFound,

    /// A cart line references a product that was not found.
    #[error("Product not found: {product_id}")]
    LineProductNotFound { product_id: String },

    /// A cart line references a variant the product does not have.
    #[error("Variant {variant_id} not found for product {product_id}")]
    VariantNotFound {
        variant_id: String,
        product_id: String,
    },

    /// A variant does not have enough stock for the requested quantity.
    #[error(
        "Insufficient stock for variant {variant_id} of product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        variant_id: String,
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The requested status change is not allowed.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// No voucher with this code exists.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    /// The voucher exists but cannot be used.
    #[error("Voucher {code} cannot be used: {reason}")]
    VoucherRejected {
        code: String,
        reason: VoucherRejection,
    },

    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Creates a validation error for a missing required field.
    pub fn missing_field(field: &'static str) -> Self {
        DomainError::Validation {
            field,
            message: format!("Missing required field: {field}"),
        }
    }

    /// Creates a validation error with a custom message.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the request itself rather than by
    /// the infrastructure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Store(_) | DomainError::Serialization(_))
    }

    /// Returns true if the error came from missing transaction support.
    pub fn is_transaction_unsupported(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_transaction_unsupported())
    }
}
