//! Order creation workflow.

use chrono::Utc;
use document_store::{DocumentStore, Session, SessionMode};
use domain::{
    CatalogRepository, CheckoutRequest, NewOrder, Order, OrderCodeGenerator, OrderRepository,
    calculate_totals, resolve_lines, unique_refs,
};

use crate::config::WorkflowConfig;
use crate::error::{CheckoutError, Result};
use crate::notify::{Notifier, confirmation_message};
use crate::state::{Progress, WorkflowState};

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,

    /// Mode the order was finally written in.
    pub mode: SessionMode,

    /// True if the transactional attempt was abandoned for autocommit.
    pub fell_back: bool,

    /// True if the confirmation was handed to the notifier.
    pub notified: bool,

    /// State the workflow finished in.
    pub state: WorkflowState,
}

/// Turns checkout requests into persisted orders.
///
/// Each attempt runs inside one [`Session`]. When the store supports
/// transactions and the policy allows them, the stock decrements and the
/// order insert commit together. Otherwise every write stands on its own:
/// concurrent checkouts may then oversell a variant, and a failure after
/// some products were saved leaves their stock decremented with no order.
pub struct OrderWorkflow<S, N>
where
    S: DocumentStore,
    N: Notifier,
{
    store: S,
    catalog: CatalogRepository<S>,
    orders: OrderRepository<S>,
    codes: OrderCodeGenerator,
    notifier: N,
    config: WorkflowConfig,
}

impl<S, N> OrderWorkflow<S, N>
where
    S: DocumentStore + Clone,
    N: Notifier,
{
    /// Creates a new workflow.
    pub fn new(store: S, notifier: N, config: WorkflowConfig) -> Self {
        Self {
            catalog: CatalogRepository::new(store.clone()),
            orders: OrderRepository::new(store.clone()),
            store,
            codes: OrderCodeGenerator::new(),
            notifier,
            config,
        }
    }

    /// Returns the workflow configuration.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Returns the mode the first attempt will use.
    pub fn preferred_mode(&self) -> SessionMode {
        if self.config.transactions.allows_transactions()
            && self.store.transaction_support().is_supported()
        {
            SessionMode::Transactional
        } else {
            SessionMode::Autocommit
        }
    }

    /// Creates an order from a checkout request.
    ///
    /// A transactional attempt that the store rejects as unsupported is
    /// retried once in autocommit mode. Any other failure is returned as is.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<PlacedOrder> {
        let started = std::time::Instant::now();
        let mode = self.preferred_mode();

        let (result, mode, fell_back) = match self.attempt(&request, mode).await {
            Err(e) if mode == SessionMode::Transactional && e.is_transaction_unsupported() => {
                tracing::warn!(error = %e, "transactions unavailable, retrying in autocommit mode");
                metrics::counter!("checkout_fallback_total").increment(1);
                let fallback = SessionMode::Autocommit;
                (self.attempt(&request, fallback).await, fallback, true)
            }
            other => (other, mode, false),
        };

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        let (order, mut progress) = match result {
            Ok(done) => done,
            Err(e) => {
                metrics::counter!("checkout_failures_total", "reason" => e.reason()).increment(1);
                return Err(e);
            }
        };

        metrics::counter!("checkout_orders_created_total", "mode" => mode.to_string())
            .increment(1);
        tracing::info!(
            order_code = %order.code,
            %mode,
            fell_back,
            total = %order.total_price,
            "order created"
        );

        debug_assert_eq!(progress.state(), WorkflowState::NotifyBestEffort);
        let notified = self.notify(&order).await;
        progress.advance();

        Ok(PlacedOrder {
            order,
            mode,
            fell_back,
            notified,
            state: progress.state(),
        })
    }

    /// Runs one attempt in the given mode, committing on success and
    /// aborting on failure. A committed attempt is left in
    /// `NotifyBestEffort`.
    async fn attempt(
        &self,
        request: &CheckoutRequest,
        mode: SessionMode,
    ) -> Result<(Order, Progress)> {
        let mut progress = Progress::default();
        let mut session = self.store.start_session(mode).await?;

        let outcome = self.run(session.as_mut(), request, &mut progress).await;
        let outcome = match outcome {
            Ok(order) => session.commit().await.map(|()| order).map_err(CheckoutError::from),
            Err(e) => {
                if let Err(abort_error) = session.abort().await {
                    tracing::warn!(error = %abort_error, "failed to abort checkout session");
                }
                Err(e)
            }
        };

        match outcome {
            Ok(order) => {
                progress.advance();
                Ok((order, progress))
            }
            Err(e) => {
                let failed_in = progress.fail();
                tracing::debug!(state = %failed_in, %mode, error = %e, "checkout attempt failed");
                Err(e)
            }
        }
    }

    /// Validates, resolves stock, prices and writes the order inside
    /// `session`. Leaves `progress` in `Persisting` on success.
    async fn run(
        &self,
        session: &mut dyn Session,
        request: &CheckoutRequest,
        progress: &mut Progress,
    ) -> Result<Order> {
        progress.advance();
        request.validate()?;

        progress.advance();
        let products = self
            .catalog
            .load_in(session, &unique_refs(&request.items))
            .await?;
        let resolution = resolve_lines(products, &request.items)?;
        for product in &resolution.touched {
            self.catalog.save_in(session, product).await?;
        }

        progress.advance();
        let totals = calculate_totals(
            &resolution.line_items,
            &request.discount,
            request.shipping_price,
            request.tax,
        );

        progress.advance();
        debug_assert_eq!(progress.state(), WorkflowState::Persisting);
        let now = Utc::now();
        let code = self.codes.generate(session, now).await?;
        let order = Order::place(
            NewOrder {
                code,
                account_id: request.account_id,
                account_email: request.account_email(),
                guest_info: request.guest_info.clone(),
                items: resolution.line_items,
                shipping_address: request.shipping_address.clone(),
                payment_method: request.payment_method.trim().to_string(),
                discount: request.discount.clone(),
                totals,
            },
            now,
        );
        self.orders.insert_in(session, &order).await?;

        Ok(order)
    }

    /// Sends the confirmation. Returns true if the notifier accepted it.
    async fn notify(&self, order: &Order) -> bool {
        let sent = match confirmation_message(order, &self.config.notification_from) {
            Ok(Some(message)) => self.notifier.send(message).await,
            Ok(None) => {
                tracing::debug!(order_code = %order.code, "no contact email, skipping confirmation");
                return false;
            }
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("checkout_notification_failures_total").increment(1);
                tracing::warn!(order_code = %order.code, error = %e, "order confirmation failed");
                false
            }
        }
    }
}
