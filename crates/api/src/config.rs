//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use checkout::{DEFAULT_NOTIFICATION_FROM, TransactionPolicy, WorkflowConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string (default: in-memory store)
/// - `DISABLE_TRANSACTIONS`: `1`/`true`/`yes`/`on` forces autocommit writes
/// - `ORDER_NOTIFICATION_FROM`: sender of order confirmations
/// - `CATALOG_SEED`: JSON file loaded into the in-memory store at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub transactions: TransactionPolicy,
    pub notification_from: String,
    pub catalog_seed: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: non_empty("DATABASE_URL"),
            transactions: TransactionPolicy::from_disable_switch(
                lookup("DISABLE_TRANSACTIONS").as_deref(),
            ),
            notification_from: non_empty("ORDER_NOTIFICATION_FROM")
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_FROM.to_string()),
            catalog_seed: non_empty("CATALOG_SEED").map(PathBuf::from),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the settings handed to the checkout workflow.
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            transactions: self.transactions,
            notification_from: self.notification_from.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
