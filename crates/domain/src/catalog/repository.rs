//! Typed access to the products collection.

use document_store::{Document, DocumentQuery, DocumentStore, DocumentStoreExt, Session};

use crate::error::DomainError;

use super::{Product, ProductStatus};

/// Collection holding product documents, keyed by external product id.
pub const PRODUCTS: &str = "products";

/// Reads and writes products.
///
/// Methods taking a [`Session`] run inside the caller's unit of work; the
/// others go straight to the store.
#[derive(Clone)]
pub struct CatalogRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> CatalogRepository<S> {
    /// Creates a repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> Result<(), DomainError> {
        self.store.insert(encode(product)?).await?;
        Ok(())
    }

    /// Loads a product by internal or external id.
    pub async fn get(&self, reference: &str) -> Result<Option<Product>, DomainError> {
        match self.store.find_by_ref(PRODUCTS, reference).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Lists products in insertion order.
    ///
    /// Unavailable products are skipped unless `include_unavailable` is set.
    pub async fn list(
        &self,
        include_unavailable: bool,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Product>, DomainError> {
        let mut query = DocumentQuery::collection(PRODUCTS);
        if !include_unavailable {
            query = query.field_equals("status", serde_json::to_value(ProductStatus::Available)?);
        }
        query.limit = limit;
        query.offset = offset;

        decode_all(self.store.query(query).await?)
    }

    /// Loads every product matching any of the references, in one batch.
    pub async fn load_in(
        &self,
        session: &mut dyn Session,
        references: &[String],
    ) -> Result<Vec<Product>, DomainError> {
        let docs = session
            .find(DocumentQuery::by_refs(PRODUCTS, references))
            .await?;
        decode_all(docs)
    }

    /// Writes a product back inside a session.
    pub async fn save_in(
        &self,
        session: &mut dyn Session,
        product: &Product,
    ) -> Result<(), DomainError> {
        session.replace(encode(product)?).await?;
        Ok(())
    }
}

fn encode(product: &Product) -> Result<Document, DomainError> {
    Ok(Document::encode(PRODUCTS, &product.product_id, product)?.with_id(product.id))
}

fn decode_all(docs: Vec<Document>) -> Result<Vec<Product>, DomainError> {
    docs.iter()
        .map(|doc| doc.decode().map_err(DomainError::from))
        .collect()
}
