//! Order service for reads and admin status changes.

use chrono::Utc;
use document_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::{Order, OrderFilter, OrderRepository, OrderStatus};

/// Command to move an order to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,

    /// Free-form note recorded in the status history.
    #[serde(default)]
    pub note: Option<String>,

    /// Overrides the paid flag.
    #[serde(default)]
    pub paid: Option<bool>,
}

/// Service for managing placed orders.
///
/// Order creation lives in the checkout workflow; this service covers what
/// happens afterwards.
#[derive(Clone)]
pub struct OrderService<S: DocumentStore> {
    orders: OrderRepository<S>,
}

impl<S: DocumentStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self {
            orders: OrderRepository::new(store),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &OrderRepository<S> {
        &self.orders
    }

    /// Loads an order, failing if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, code: &str) -> Result<Order, DomainError> {
        self.orders
            .get(code)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(code.to_string()))
    }

    /// Lists orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, DomainError> {
        self.orders.list(&filter).await
    }

    /// Applies a status change.
    ///
    /// Setting the current status again only updates the paid flag, so the
    /// call can also be used to mark an order as paid.
    #[tracing::instrument(skip(self, cmd), fields(status = %cmd.status))]
    pub async fn update_status(
        &self,
        code: &str,
        cmd: UpdateOrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self.get(code).await?;
        let now = Utc::now();

        if cmd.status != order.status {
            let from = order.status;
            order.transition(cmd.status, cmd.note, now)?;
            tracing::info!(order_code = %order.code, %from, to = %order.status, "order status changed");
        }
        if let Some(paid) = cmd.paid {
            order.set_paid(paid, now)?;
        }

        self.orders.save(&order).await?;
        Ok(order)
    }
}
