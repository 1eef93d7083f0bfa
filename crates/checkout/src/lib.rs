//! Order creation workflow for the storefront.
//!
//! The workflow turns a submitted cart into a persisted order:
//! 1. Validate the checkout request
//! 2. Resolve cart lines against live stock and decrement it
//! 3. Compute totals
//! 4. Generate an order code and write the order
//! 5. Send a best-effort confirmation
//!
//! Steps 2 to 4 share one store session. The session is transactional when
//! both the configuration and the store allow it; a store that rejects the
//! transaction at runtime triggers a single retry in autocommit mode.

pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod workflow;

pub use config::{DEFAULT_NOTIFICATION_FROM, TransactionPolicy, WorkflowConfig};
pub use error::CheckoutError;
pub use notify::{
    InMemoryNotifier, LogNotifier, Message, Notifier, NotifyError, confirmation_message,
};
pub use state::WorkflowState;
pub use workflow::{OrderWorkflow, PlacedOrder};
