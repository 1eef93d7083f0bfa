//! Resolving cart lines against the catalog and taking stock.

use std::collections::HashSet;

use common::DocumentId;

use crate::catalog::Product;
use crate::checkout::CartLine;
use crate::error::DomainError;
use crate::order::LineItem;

/// Outcome of resolving a cart.
#[derive(Debug, Clone)]
pub struct StockResolution {
    /// Frozen line items, in cart order.
    pub line_items: Vec<LineItem>,

    /// Products whose stock was decremented, in first-touched order. These
    /// must be written back in the same unit of work as the order.
    pub touched: Vec<Product>,
}

/// Returns the distinct product references of a cart, in first-seen order.
pub fn unique_refs(lines: &[CartLine]) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|line| seen.insert(line.product_id.as_str()))
        .map(|line| line.product_id.clone())
        .collect()
}

/// Matches each cart line to a product variant and decrements its stock.
///
/// `products` is the batch loaded for [`unique_refs`]. Lines are handled in
/// order, so two lines on the same variant see each other's decrement. The
/// first failing line aborts the whole resolution; `products` is consumed
/// and nothing is written.
pub fn resolve_lines(
    mut products: Vec<Product>,
    lines: &[CartLine],
) -> Result<StockResolution, DomainError> {
    if products.is_empty() {
        return Err(DomainError::ProductsNotFound);
    }

    let mut line_items = Vec::with_capacity(lines.len());
    let mut touched: Vec<DocumentId> = Vec::new();

    for line in lines {
        let product = products
            .iter_mut()
            .find(|p| p.matches_ref(&line.product_id))
            .ok_or_else(|| DomainError::LineProductNotFound {
                product_id: line.product_id.clone(),
            })?;

        let product_ref = product.id;
        let product_id = product.product_id.clone();
        let product_name = product.name.clone();

        let variant = product.variant_mut(&line.variant_id).ok_or_else(|| {
            DomainError::VariantNotFound {
                variant_id: line.variant_id.clone(),
                product_id: product_id.clone(),
            }
        })?;

        let quantity = line.normalized_quantity();
        if !variant.has_stock_for(quantity) {
            return Err(DomainError::InsufficientStock {
                variant_id: variant.variant_id.clone(),
                product_id,
                requested: quantity,
                available: variant.stock,
            });
        }
        variant.stock -= quantity;

        line_items.push(LineItem {
            product_ref,
            product_id,
            variant_id: variant.variant_id.clone(),
            name: format!("{} - {}", product_name, variant.name),
            price: variant.price,
            quantity,
        });

        product.refresh_sold_out();
        if !touched.contains(&product_ref) {
            touched.push(product_ref);
        }
    }

    let touched = touched
        .into_iter()
        .filter_map(|id| {
            products
                .iter()
                .position(|p| p.id == id)
                .map(|index| products.swap_remove(index))
        })
        .collect();

    Ok(StockResolution {
        line_items,
        touched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Variant;
    use crate::value_objects::Money;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("P1", "Tee")
                .with_variant(Variant::new("V1", "Small", Money::from_minor(500_000), 10))
                .with_variant(Variant::new("V2", "Large", Money::from_minor(550_000), 1)),
            Product::new("P2", "Mug").with_variant(Variant::new(
                "V1",
                "Blue",
                Money::from_minor(120_000),
                3,
            )),
        ]
    }

    #[test]
    fn unique_refs_deduplicates_in_order() {
        let lines = vec![
            CartLine::new("P2", "V1", 1),
            CartLine::new("P1", "V1", 1),
            CartLine::new("P2", "V1", 1),
        ];
        assert_eq!(unique_refs(&lines), vec!["P2", "P1"]);
    }

    #[test]
    fn resolves_and_decrements() {
        let resolution = resolve_lines(catalog(), &[CartLine::new("P1", "V1", 2)]).unwrap();

        assert_eq!(resolution.line_items.len(), 1);
        let item = &resolution.line_items[0];
        assert_eq!(item.name, "Tee - Small");
        assert_eq!(item.price.minor(), 500_000);
        assert_eq!(item.quantity, 2);

        assert_eq!(resolution.touched.len(), 1);
        assert_eq!(resolution.touched[0].variant("V1").unwrap().stock, 8);
    }

    #[test]
    fn resolves_by_internal_id() {
        let products = catalog();
        let internal = products[1].id.to_string();
        let resolution = resolve_lines(products, &[CartLine::new(internal, "V1", 1)]).unwrap();

        assert_eq!(resolution.line_items[0].product_id, "P2");
        assert_eq!(resolution.touched[0].variant("V1").unwrap().stock, 2);
    }

    #[test]
    fn empty_batch_is_products_not_found() {
        let err = resolve_lines(Vec::new(), &[CartLine::new("P1", "V1", 1)]).unwrap_err();
        assert!(matches!(err, DomainError::ProductsNotFound));
    }

    #[test]
    fn unknown_line_product() {
        let err = resolve_lines(catalog(), &[CartLine::new("P9", "V1", 1)]).unwrap_err();
        assert!(matches!(err, DomainError::LineProductNotFound { product_id } if product_id == "P9"));
    }

    #[test]
    fn unknown_variant() {
        let err = resolve_lines(catalog(), &[CartLine::new("P1", "V9", 1)]).unwrap_err();
        assert!(matches!(
            err,
            DomainError::VariantNotFound { variant_id, product_id }
                if variant_id == "V9" && product_id == "P1"
        ));
    }

    #[test]
    fn insufficient_stock_names_variant() {
        let err = resolve_lines(catalog(), &[CartLine::new("P1", "V2", 2)]).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                variant_id,
                product_id,
                requested,
                available,
            } => {
                assert_eq!(variant_id, "V2");
                assert_eq!(product_id, "P1");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn repeated_lines_share_stock() {
        let lines = vec![CartLine::new("P2", "V1", 2), CartLine::new("P2", "V1", 2)];
        let err = resolve_lines(catalog(), &lines).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { available: 1, .. }));

        let lines = vec![CartLine::new("P2", "V1", 2), CartLine::new("P2", "V1", 1)];
        let resolution = resolve_lines(catalog(), &lines).unwrap();
        assert_eq!(resolution.line_items.len(), 2);
        assert_eq!(resolution.touched.len(), 1);
        let mug = &resolution.touched[0];
        assert_eq!(mug.variant("V1").unwrap().stock, 0);
        assert!(mug.sold_out);
    }

    #[test]
    fn zero_quantity_counts_as_one() {
        let resolution = resolve_lines(catalog(), &[CartLine::new("P1", "V2", 0)]).unwrap();
        assert_eq!(resolution.line_items[0].quantity, 1);
        assert_eq!(resolution.touched[0].variant("V2").unwrap().stock, 0);
        assert!(!resolution.touched[0].sold_out);
    }

    #[test]
    fn untouched_products_are_not_returned() {
        let resolution = resolve_lines(catalog(), &[CartLine::new("P2", "V1", 1)]).unwrap();
        assert_eq!(resolution.touched.len(), 1);
        assert_eq!(resolution.touched[0].product_id, "P2");
    }
}
