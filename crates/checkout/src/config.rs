//! Workflow configuration.

use serde::{Deserialize, Serialize};

/// Default sender address for order confirmations.
pub const DEFAULT_NOTIFICATION_FROM: &str = "orders@storefront.local";

/// Whether the workflow may use transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransactionPolicy {
    /// Use a transaction when the store supports it, and fall back to
    /// autocommit when the store turns out not to.
    #[default]
    Auto,

    /// Never open a transaction.
    Disabled,
}

impl TransactionPolicy {
    /// Builds the policy from a "disable transactions" switch.
    ///
    /// `1`, `true`, `yes` and `on` (any case) disable transactions. Anything
    /// else, including an unset switch, leaves them enabled.
    pub fn from_disable_switch(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => {
                TransactionPolicy::Disabled
            }
            _ => TransactionPolicy::Auto,
        }
    }

    /// Returns true if transactions may be attempted.
    pub fn allows_transactions(&self) -> bool {
        matches!(self, TransactionPolicy::Auto)
    }
}

/// Settings injected into the order workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub transactions: TransactionPolicy,

    /// Sender address of confirmation messages.
    pub notification_from: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            transactions: TransactionPolicy::Auto,
            notification_from: DEFAULT_NOTIFICATION_FROM.to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Returns a copy with the given transaction policy.
    pub fn with_transactions(mut self, policy: TransactionPolicy) -> Self {
        self.transactions = policy;
        self
    }
}
