use common::DocumentId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CartLine, DiscountInput, LineItem, Money, Product, Variant, calculate_totals, resolve_lines,
};

fn line_items(count: usize) -> Vec<LineItem> {
    (0..count)
        .map(|i| LineItem {
            product_ref: DocumentId::new(),
            product_id: format!("P{i}"),
            variant_id: "V1".to_string(),
            name: format!("Product {i} - Default"),
            price: Money::from_minor(100_000 + i as i64),
            quantity: 1 + (i % 3) as u32,
        })
        .collect()
}

fn catalog(count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| {
            Product::new(format!("P{i}"), format!("Product {i}")).with_variant(Variant::new(
                "V1",
                "Default",
                Money::from_minor(100_000),
                1_000,
            ))
        })
        .collect()
}

fn bench_calculate_totals(c: &mut Criterion) {
    let items = line_items(50);
    let discount = DiscountInput {
        code: Some("SALE10".to_string()),
        percent: 10,
        amount: Money::from_minor(5_000),
    };

    c.bench_function("pricing/calculate_totals_50_lines", |b| {
        b.iter(|| {
            calculate_totals(
                &items,
                &discount,
                Money::from_minor(30_000),
                Money::from_minor(1_000),
            )
        });
    });
}

fn bench_resolve_lines(c: &mut Criterion) {
    let products = catalog(20);
    let lines: Vec<CartLine> = (0..20)
        .map(|i| CartLine::new(format!("P{i}"), "V1", 2))
        .collect();

    c.bench_function("stock/resolve_20_lines", |b| {
        b.iter(|| resolve_lines(products.clone(), &lines).unwrap());
    });
}

criterion_group!(benches, bench_calculate_totals, bench_resolve_lines);
criterion_main!(benches);
