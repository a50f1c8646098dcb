//! Benchmarks for orderbook operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use perpbook::orderbook::OrderBook;
use perpbook::types::{BookEvent, Exchange, PriceLevel, Symbol};
use rust_decimal::Decimal;

fn symbol() -> Symbol {
    Symbol::new(Exchange::Hyperliquid, "BTC", "USD")
}

fn populated_book(levels: usize) -> OrderBook {
    let mut book = OrderBook::new(symbol());
    let bids = (0..levels)
        .map(|i| PriceLevel::new(Decimal::from(50_000 - i as i64), Decimal::ONE))
        .collect();
    let asks = (0..levels)
        .map(|i| PriceLevel::new(Decimal::from(50_001 + i as i64), Decimal::ONE))
        .collect();
    book.apply(&BookEvent::Snapshot { bids, asks });
    book
}

fn bench_apply_delta(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_apply_delta");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut book = populated_book(size);
            let delta = BookEvent::Delta {
                bids: vec![PriceLevel::new(
                    Decimal::from(50_000 - (size as i64) / 2),
                    Decimal::from(7),
                )],
                asks: vec![],
            };

            b.iter(|| {
                book.apply(black_box(&delta));
            });
        });
    }

    group.finish();
}

fn bench_best_bid(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_best_bid");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = populated_book(size);

            b.iter(|| {
                black_box(book.best_bid());
            });
        });
    }

    group.finish();
}

fn bench_depth_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("orderbook_depth_view");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let book = populated_book(size);

            b.iter(|| {
                black_box(book.depth_view(15));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_apply_delta, bench_best_bid, bench_depth_view);
criterion_main!(benches);
