//! Catalog seeding for stores that start empty.
//!
//! The seed file is a JSON object with optional `products` and `vouchers`
//! arrays, using the same camelCase shape the API returns.

use std::path::Path;

use document_store::DocumentStore;
use domain::{CatalogRepository, DomainError, Product, Voucher, VoucherRepository};
use serde::Deserialize;
use thiserror::Error;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub vouchers: Vec<Voucher>,
}

/// Errors raised while loading or applying a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to store seed data: {0}")]
    Domain(#[from] DomainError),
}

impl CatalogSeed {
    /// Parses a seed document.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let mut seed: CatalogSeed = serde_json::from_str(json)?;
        for product in &mut seed.products {
            product.refresh_sold_out();
        }
        Ok(seed)
    }

    /// Reads and parses a seed file.
    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Inserts every product and voucher.
    pub async fn apply<S: DocumentStore + Clone>(&self, store: &S) -> Result<(), SeedError> {
        let catalog = CatalogRepository::new(store.clone());
        for product in &self.products {
            catalog.insert(product).await?;
        }

        let vouchers = VoucherRepository::new(store.clone());
        for voucher in &self.vouchers {
            vouchers.insert(voucher).await?;
        }

        tracing::info!(
            products = self.products.len(),
            vouchers = self.vouchers.len(),
            "catalog seeded"
        );
        Ok(())
    }
}
