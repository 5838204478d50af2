//! 撮合引擎
//!
//! `MatchingEngine` owns every order book and is the only thing that mutates
//! them. It is shared by reference (`Arc<MatchingEngine>`) between all
//! submitting tasks.
//!
//! ## Locking
//! - `books`: `RwLock` over the asset registry. Lookups take the read lock;
//!   creating a book takes the write lock and re-checks, so each asset gets
//!   exactly one book.
//! - each book sits behind its own `Mutex`. A submission holds it from the
//!   push until the matching loop returns, which makes push + match atomic
//!   per asset while unrelated assets proceed in parallel.
//!
//! The registry lock is always released before a book lock is taken.

use crate::config::EngineConfig;
use crate::domain::order::Trade;
use crate::domain::orderbook::{BookSnapshot, OrderBook};
use crate::domain::pricing::PricingPolicy;
use crate::domain::validation::{OrderValidator, ValidationError};
use crate::protocol::NewOrderRequest;
use crate::shared::metrics::METRICS;
use crate::shared::timestamp::now_nanos;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedBook = Arc<Mutex<OrderBook>>;

pub struct MatchingEngine {
    books: RwLock<HashMap<Arc<str>, SharedBook>>,
    validator: OrderValidator,
    pricing: PricingPolicy,
    // 到达序号，从 1 开始
    next_sequence: AtomicU64,
    next_trade_id: AtomicU64,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        MatchingEngine {
            books: RwLock::new(HashMap::new()),
            validator: OrderValidator::with_config(config.validation),
            pricing: config.pricing,
            next_sequence: AtomicU64::new(1),
            next_trade_id: AtomicU64::new(1),
        }
    }

    pub fn pricing(&self) -> PricingPolicy {
        self.pricing
    }

    /// Validates, sequences, rests and matches one order.
    ///
    /// Returns the trades in the order they were produced. A rejected
    /// request changes nothing: no book is created and no sequence number is
    /// consumed.
    ///
    /// Accepted orders are numbered 1, 2, 3, ... in submission order; within
    /// one book that numbering is also the time priority.
    pub fn submit(&self, request: &NewOrderRequest) -> Result<Vec<Trade>, ValidationError> {
        let validated = match self.validator.validate(request) {
            Ok(validated) => validated,
            Err(e) => {
                METRICS
                    .orders_rejected_total
                    .with_label_values(&[e.reason()])
                    .inc();
                warn!(user_id = %request.user_id, asset = %request.asset, "order rejected: {}", e);
                return Err(e);
            }
        };

        let side = validated.side;
        let shared = self.get_or_create_book(&validated.asset);

        let mut book = shared.lock();
        let timer = METRICS
            .matching_duration
            .with_label_values(&[validated.asset.as_str()])
            .start_timer();
        // 在持有订单簿锁时取号，保证同一订单簿内序号与入簿顺序一致
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let order = validated.into_order(book.asset().clone(), sequence);
        let fills = book.add_order(order, self.pricing);

        let timestamp = now_nanos();
        let mut trades = fills.into_vec();
        for trade in trades.iter_mut() {
            trade.trade_id = self.next_trade_id.fetch_add(1, Ordering::Relaxed);
            trade.timestamp = timestamp;
        }

        let asset = book.asset().clone();
        let asset_label: &str = &asset;
        let (bids, asks) = (book.buy_orders().len(), book.sell_orders().len());
        drop(book);
        timer.observe_duration();

        METRICS
            .orders_total
            .with_label_values(&[side.as_str(), asset_label])
            .inc();
        METRICS
            .orderbook_depth
            .with_label_values(&[asset_label, "buy"])
            .set(bids as f64);
        METRICS
            .orderbook_depth
            .with_label_values(&[asset_label, "sell"])
            .set(asks as f64);

        if !trades.is_empty() {
            let volume: u64 = trades.iter().map(|t| t.matched_amount).sum();
            METRICS
                .trades_total
                .with_label_values(&[asset_label])
                .inc_by(trades.len() as f64);
            METRICS
                .matched_volume_total
                .with_label_values(&[asset_label])
                .inc_by(volume as f64);
        }

        for trade in &trades {
            debug!(
                trade_id = trade.trade_id,
                asset = %trade.asset,
                "matching {} of {} (buy) with {} (sell) at price {:.2}",
                trade.matched_amount,
                trade.buyer,
                trade.seller,
                trade.price
            );
        }

        Ok(trades)
    }

    /// Returns the book for `asset`, creating an empty one on first use.
    ///
    /// Concurrent callers for the same asset always receive the same book.
    pub fn get_or_create_book(&self, asset: &str) -> SharedBook {
        // 快速路径：读锁查找
        {
            let books = self.books.read();
            if let Some(book) = books.get(asset) {
                return book.clone();
            }
        }

        // 慢速路径：写锁下再次检查
        let mut books = self.books.write();
        books
            .entry(Arc::from(asset))
            .or_insert_with_key(|key| {
                debug!(asset = %key, "creating order book");
                Arc::new(Mutex::new(OrderBook::new(key.clone())))
            })
            .clone()
    }

    /// Existing book for `asset`, without creating one.
    pub fn book(&self, asset: &str) -> Option<SharedBook> {
        self.books.read().get(asset).cloned()
    }

    pub fn snapshot(&self, asset: &str) -> Option<BookSnapshot> {
        self.book(asset).map(|book| book.lock().snapshot())
    }

    pub fn best_bid(&self, asset: &str) -> Option<f64> {
        self.book(asset).and_then(|book| book.lock().best_bid())
    }

    pub fn best_ask(&self, asset: &str) -> Option<f64> {
        self.book(asset).and_then(|book| book.lock().best_ask())
    }

    pub fn spread(&self, asset: &str) -> Option<f64> {
        self.book(asset).and_then(|book| book.lock().spread())
    }

    /// Assets with a book, sorted.
    pub fn assets(&self) -> Vec<Arc<str>> {
        let mut assets: Vec<Arc<str>> = self.books.read().keys().cloned().collect();
        assets.sort();
        assets
    }

    pub fn book_count(&self) -> usize {
        self.books.read().len()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
