use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Document, DocumentId, DocumentQuery, Result};

/// Whether the backing store can run multi-document transactions.
///
/// Probed once when the store is set up; the checkout workflow uses it to pick
/// its execution mode instead of discovering the limitation mid-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionSupport {
    Supported,
    Unsupported,
}

impl TransactionSupport {
    /// Returns true if transactional sessions can be opened.
    pub fn is_supported(&self) -> bool {
        matches!(self, TransactionSupport::Supported)
    }
}

impl std::fmt::Display for TransactionSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionSupport::Supported => write!(f, "supported"),
            TransactionSupport::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// How a session applies its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    /// Writes are staged and applied atomically on commit. Reads observe the
    /// session's own staged writes.
    Transactional,

    /// Every write is committed on its own. Commit and abort are no-ops.
    Autocommit,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Transactional => write!(f, "transactional"),
            SessionMode::Autocommit => write!(f, "autocommit"),
        }
    }
}

/// A unit of work against the store.
///
/// Dropping a transactional session without committing discards its writes.
#[async_trait]
pub trait Session: Send {
    /// Returns the mode this session was opened with.
    fn mode(&self) -> SessionMode;

    /// Finds documents matching a query.
    ///
    /// In a transactional session the matched documents stay locked against
    /// other transactions until the session ends.
    async fn find(&mut self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Returns true if a document with the key exists in the collection.
    async fn key_exists(&mut self, collection: &str, key: &str) -> Result<bool>;

    /// Inserts a new document.
    ///
    /// Fails with `DuplicateKey` if the collection already holds the key.
    async fn insert(&mut self, document: Document) -> Result<()>;

    /// Replaces an existing document, matched by id.
    async fn replace(&mut self, document: Document) -> Result<()>;

    /// Commits the session's writes.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards the session's writes.
    async fn abort(self: Box<Self>) -> Result<()>;
}

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reports whether transactional sessions are available.
    fn transaction_support(&self) -> TransactionSupport;

    /// Opens a session.
    ///
    /// Opening a transactional session on a store without transaction
    /// support fails with `TransactionUnsupported`.
    async fn start_session(&self, mode: SessionMode) -> Result<Box<dyn Session>>;

    /// Retrieves a document by id.
    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>>;

    /// Retrieves a document by its unique key.
    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Retrieves documents matching a query.
    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Inserts a document outside of any session.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Replaces a document outside of any session.
    async fn replace(&self, document: Document) -> Result<()>;

    /// Counts the documents in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Retrieves a document by a reference that may be an id or a key.
    async fn find_by_ref(&self, collection: &str, reference: &str) -> Result<Option<Document>> {
        if let Some(id) = DocumentId::try_parse(reference)
            && let Some(doc) = self.get(collection, id).await?
        {
            return Ok(Some(doc));
        }
        self.find_by_key(collection, reference).await
    }

    /// Inserts several documents one by one, stopping at the first failure.
    async fn insert_all(&self, documents: Vec<Document>) -> Result<usize> {
        let mut inserted = 0;
        for document in documents {
            self.insert(document).await?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Error returned when a document is not acceptable for writing.
#[derive(Debug, Clone)]
pub struct DocumentValidationError {
    pub message: String,
}

impl std::fmt::Display for DocumentValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document validation error: {}", self.message)
    }
}

impl std::error::Error for DocumentValidationError {}

/// Validates a document before writing.
pub fn validate_document(document: &Document) -> std::result::Result<(), DocumentValidationError> {
    if document.collection.trim().is_empty() {
        return Err(DocumentValidationError {
            message: "Collection name must not be empty".to_string(),
        });
    }
    if document.key.trim().is_empty() {
        return Err(DocumentValidationError {
            message: format!("Document {} has an empty key", document.id),
        });
    }
    if !document.body.is_object() {
        return Err(DocumentValidationError {
            message: format!("Document {} body must be a JSON object", document.id),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_key() {
        let doc = Document::new("products", " ", serde_json::json!({}));
        let err = validate_document(&doc).unwrap_err();
        assert!(err.message.contains("empty key"));
    }

    #[test]
    fn validate_rejects_non_object_body() {
        let doc = Document::new("products", "P1", serde_json::json!([1, 2]));
        assert!(validate_document(&doc).is_err());
    }

    #[test]
    fn validate_accepts_object_body() {
        let doc = Document::new("products", "P1", serde_json::json!({"name": "Tee"}));
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn transaction_support_display() {
        assert_eq!(TransactionSupport::Supported.to_string(), "supported");
        assert_eq!(TransactionSupport::Unsupported.to_string(), "unsupported");
        assert!(TransactionSupport::Supported.is_supported());
        assert!(!TransactionSupport::Unsupported.is_supported());
    }
}
