use thiserror::Error;

use crate::DocumentId;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document with the same key already exists in the collection.
    #[error("Duplicate key '{key}' in collection {collection}")]
    DuplicateKey { collection: String, key: String },

    /// The document to replace does not exist.
    #[error("Document {id} not found in collection {collection}")]
    NotFound { collection: String, id: DocumentId },

    /// The backing store cannot run multi-document transactions.
    #[error("Transactions are not supported by this deployment: {0}")]
    TransactionUnsupported(String),

    /// The document is not acceptable for writing.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A backend failure that is not a database driver error.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the failure came from missing transaction support.
    pub fn is_transaction_unsupported(&self) -> bool {
        matches!(self, StoreError::TransactionUnsupported(_))
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
