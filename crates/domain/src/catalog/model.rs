//! Product and variant documents.

use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Whether a product is offered in the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Available,
    Unavailable,
}

/// A purchasable SKU of a product, with its own price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Identifier unique within the owning product.
    pub variant_id: String,

    pub name: String,

    /// Unit price in minor units.
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: u32,
}

impl Variant {
    /// Creates a new variant.
    pub fn new(
        variant_id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            name: name.into(),
            price,
            stock,
        }
    }

    /// Returns true if `quantity` units can be taken.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// A catalog product with its embedded variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier. Generated when absent from seed data.
    #[serde(default = "DocumentId::new")]
    pub id: DocumentId,

    /// External stable identifier, used in static links.
    pub product_id: String,

    pub name: String,

    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Reference to the owning category.
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub status: ProductStatus,

    #[serde(default)]
    pub sold_out: bool,

    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Creates an available product with no variants.
    pub fn new(product_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            product_id: product_id.into(),
            name: name.into(),
            brand: None,
            description: None,
            category: None,
            status: ProductStatus::Available,
            sold_out: false,
            images: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Adds a variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self.refresh_sold_out();
        self
    }

    /// Sets the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Returns true if `reference` is either this product's internal id or
    /// its external id.
    pub fn matches_ref(&self, reference: &str) -> bool {
        self.product_id == reference || self.id.to_string() == reference
    }

    /// Returns a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }

    /// Returns a mutable variant by id.
    pub fn variant_mut(&mut self, variant_id: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.variant_id == variant_id)
    }

    /// Returns the stock summed over all variants.
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }

    /// Returns true if the product is shown in the storefront.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }

    /// Recomputes `sold_out` from variant stock.
    pub fn refresh_sold_out(&mut self) {
        self.sold_out = !self.variants.is_empty() && self.total_stock() == 0;
    }
}
