//! Typed access to the orders collection.

use document_store::{Document, DocumentQuery, DocumentStore, Session};

use crate::error::DomainError;

use super::{Order, OrderStatus};

/// Collection holding order documents, keyed by order code.
pub const ORDERS: &str = "orders";

/// Filter for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Reads and writes orders.
#[derive(Clone)]
pub struct OrderRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts a new order inside a session.
    ///
    /// Fails with a duplicate key store error if the code is taken.
    pub async fn insert_in(
        &self,
        session: &mut dyn Session,
        order: &Order,
    ) -> Result<(), DomainError> {
        session.insert(encode(order)?).await?;
        Ok(())
    }

    /// Loads an order by code.
    pub async fn get(&self, code: &str) -> Result<Option<Order>, DomainError> {
        match self.store.find_by_key(ORDERS, code).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Lists orders, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut query = DocumentQuery::collection(ORDERS).newest_first();
        if let Some(status) = filter.status {
            query = query.field_equals("status", serde_json::to_value(status)?);
        }
        query.limit = filter.limit;
        query.offset = filter.offset;

        self.store
            .query(query)
            .await?
            .iter()
            .map(|doc| doc.decode().map_err(DomainError::from))
            .collect()
    }

    /// Writes back an existing order.
    pub async fn save(&self, order: &Order) -> Result<(), DomainError> {
        self.store.replace(encode(order)?).await?;
        Ok(())
    }

    /// Returns the number of stored orders.
    pub async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.store.count(ORDERS).await?)
    }
}

fn encode(order: &Order) -> Result<Document, DomainError> {
    Ok(Document::encode(ORDERS, &order.code, order)?
        .with_id(order.id)
        .with_created_at(order.created_at))
}
