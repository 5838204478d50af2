use auction_engine::domain::{Order, OrderBook};
use auction_engine::{MatchingEngine, NewOrderRequest, PricingPolicy, Side};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;

const BOOK_SIZE: u64 = 1000;

/// 预填充卖单的订单簿，每个价位一笔
fn master_book(asset: &Arc<str>) -> OrderBook {
    let mut book = OrderBook::new(asset.clone());
    for i in 0..BOOK_SIZE {
        let order = Order::new(
            Arc::from(format!("seller-{}", i).as_str()),
            asset.clone(),
            Side::Sell,
            50_000.0 + i as f64,
            10,
            i + 1,
        );
        book.add_order(order, PricingPolicy::SellSide);
    }
    book
}

fn orderbook_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderBook Matching");
    let asset: Arc<str> = Arc::from("BTC");
    let master = master_book(&asset);
    let buyer: Arc<str> = Arc::from("buyer");

    group.bench_function("1-to-1 match in a cloned book with 1000 levels", |b| {
        b.iter_batched(
            || {
                let order = Order::new(buyer.clone(), asset.clone(), Side::Buy, 50_000.0, 10, BOOK_SIZE + 1);
                (master.clone(), order)
            },
            |(mut book, order)| black_box(book.add_order(black_box(order), PricingPolicy::SellSide)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("sweep 50 levels in a cloned book", |b| {
        b.iter_batched(
            || {
                let order = Order::new(buyer.clone(), asset.clone(), Side::Buy, 50_049.0, 500, BOOK_SIZE + 1);
                (master.clone(), order)
            },
            |(mut book, order)| black_box(book.add_order(black_box(order), PricingPolicy::SellSide)),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("rest without crossing", |b| {
        b.iter_batched(
            || {
                let order = Order::new(buyer.clone(), asset.clone(), Side::Buy, 49_000.0, 10, BOOK_SIZE + 1);
                (master.clone(), order)
            },
            |(mut book, order)| black_box(book.add_order(black_box(order), PricingPolicy::SellSide)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn engine_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("MatchingEngine Submit");
    let engine = MatchingEngine::new();
    let mut i: u64 = 0;

    // 买卖交替且价格相同，每两笔撮合一次，订单簿保持很浅
    group.bench_function("alternating buy/sell on one asset", |b| {
        b.iter(|| {
            i += 1;
            let request = if i % 2 == 0 {
                NewOrderRequest::buy("b", "BTC", 100.0, 1)
            } else {
                NewOrderRequest::sell("s", "BTC", 100.0, 1)
            };
            black_box(engine.submit(black_box(&request)))
        });
    });

    group.finish();
}

criterion_group!(benches, orderbook_matching, engine_submit);
criterion_main!(benches);
