//! Document storage for the storefront.
//!
//! Documents are JSON bodies grouped in collections. Each document has a
//! store-assigned [`DocumentId`] and a `key` that is unique within its
//! collection (a product's external id, an order's code).
//!
//! Writes go through a [`Session`]. A transactional session stages its writes
//! and applies them on commit; an autocommit session applies each write
//! immediately. Whether transactions are available at all is reported by
//! [`DocumentStore::transaction_support`].

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::DocumentId;
pub use document::Document;
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::DocumentQuery;
pub use store::{DocumentStore, DocumentStoreExt, Session, SessionMode, TransactionSupport};
