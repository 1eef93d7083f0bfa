use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{DocumentId, Result};

/// A stored document: a JSON body plus the fields the store indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: DocumentId,

    /// The collection this document belongs to (e.g. "products", "orders").
    pub collection: String,

    /// Key unique within the collection.
    pub key: String,

    /// The document body.
    pub body: serde_json::Value,

    /// When the document was first inserted.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document with a fresh id from a raw JSON body.
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            collection: collection.into(),
            key: key.into(),
            body,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a document by serializing a value.
    pub fn encode<T: Serialize>(
        collection: impl Into<String>,
        key: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        Ok(Self::new(collection, key, serde_json::to_value(value)?))
    }

    /// Sets the document id.
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Deserializes the body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Replaces the body with a serialized value and bumps `updated_at`.
    pub fn set_body<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.body = serde_json::to_value(value)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
