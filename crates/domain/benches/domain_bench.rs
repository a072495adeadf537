use std::collections::BTreeMap;
use std::hint::black_box;

use common::UserId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Cart, Money, Product};

fn bench_recompute_summary(c: &mut Criterion) {
    let user = UserId::new();
    let mut cart = Cart::new(user);
    for i in 0..50 {
        let mut product = Product::new(format!("Product {i}"), Money::from_rupees(500 + i), 100);
        product.price.discount_percent = (i % 30) as u32;
        cart.add_item(&product, 1 + (i % 4) as u32, BTreeMap::new())
            .unwrap();
    }

    c.bench_function("cart/recompute_summary_50_items", |b| {
        b.iter(|| {
            cart.recompute_summary();
            black_box(&cart.summary);
        });
    });
}

fn bench_add_item(c: &mut Criterion) {
    let product = Product::new("Benchmark Bike", Money::from_rupees(500), u32::MAX);

    c.bench_function("cart/add_item_merge", |b| {
        let mut cart = Cart::new(UserId::new());
        b.iter(|| {
            cart.add_item(&product, 1, BTreeMap::new()).unwrap();
        });
    });
}

criterion_group!(benches, bench_recompute_summary, bench_add_item);
criterion_main!(benches);
