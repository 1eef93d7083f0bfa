//! Product catalog: products with embedded variants.

mod model;
mod repository;

pub use model::{Product, ProductStatus, Variant};
pub use repository::{CatalogRepository, PRODUCTS};
