//! 单个资产的订单簿
//!
//! Pairs a buy-side and a sell-side `OrderHeap` and owns the matching loop.
//! After `add_order` returns the book is never crossed: either one side is
//! empty or the best bid is strictly below the best ask.

mod heap;

pub use heap::{BestOrder, OrderHeap};

use crate::domain::order::{Order, Trade};
use crate::domain::pricing::PricingPolicy;
use crate::protocol::Side;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Trades produced by a single arrival; most orders cross a handful of
/// resting orders at most.
pub type Fills = SmallVec<[Trade; 8]>;

#[derive(Debug, Clone)]
pub struct OrderBook {
    asset: Arc<str>,
    // 买单侧，价格从高到低
    buy_orders: OrderHeap,
    // 卖单侧，价格从低到高
    sell_orders: OrderHeap,
}

impl OrderBook {
    pub fn new(asset: Arc<str>) -> Self {
        OrderBook {
            asset,
            buy_orders: OrderHeap::new(Side::Buy),
            sell_orders: OrderHeap::new(Side::Sell),
        }
    }

    pub fn asset(&self) -> &Arc<str> {
        &self.asset
    }

    pub fn buy_orders(&self) -> &OrderHeap {
        &self.buy_orders
    }

    pub fn sell_orders(&self) -> &OrderHeap {
        &self.sell_orders
    }

    /// Rests `order` on its side and matches until the book no longer crosses.
    ///
    /// Returned trades carry `trade_id == 0` and `timestamp == 0`; the engine
    /// stamps them.
    pub fn add_order(&mut self, order: Order, pricing: PricingPolicy) -> Fills {
        debug_assert_eq!(order.asset, self.asset);
        let aggressor = order.side;
        match order.side {
            Side::Buy => self.buy_orders.push(order),
            Side::Sell => self.sell_orders.push(order),
        }
        self.match_orders(aggressor, pricing)
    }

    /// 撮合循环
    ///
    /// Each step fills `min(best bid, best ask)` and pops whichever top is
    /// exhausted, so it runs at most once per resting order plus one.
    fn match_orders(&mut self, aggressor: Side, pricing: PricingPolicy) -> Fills {
        let mut fills = Fills::new();

        loop {
            let (Some(mut bid), Some(mut ask)) =
                (self.buy_orders.peek_best_mut(), self.sell_orders.peek_best_mut())
            else {
                break;
            };

            if bid.price < ask.price {
                break;
            }

            let qty = bid.amount.min(ask.amount);
            let price = pricing.trade_price(aggressor, bid.price, ask.price);

            bid.fill(qty);
            ask.fill(qty);

            fills.push(Trade {
                trade_id: 0,
                asset: self.asset.clone(),
                buyer: bid.user_id.clone(),
                seller: ask.user_id.clone(),
                matched_amount: qty,
                price,
                buy_sequence: bid.sequence,
                sell_sequence: ask.sequence,
                aggressor,
                timestamp: 0,
            });

            if bid.is_filled() {
                BestOrder::pop(bid);
            }
            if ask.is_filled() {
                BestOrder::pop(ask);
            }
        }

        debug_assert!(!self.is_crossed(), "book {} left crossed", self.asset);
        fills
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.buy_orders.peek_best().map(|o| o.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.sell_orders.peek_best().map(|o| o.price)
    }

    /// best_ask - best_bid, when both sides are present.
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }

    pub fn is_empty(&self) -> bool {
        self.buy_orders.is_empty() && self.sell_orders.is_empty()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        let rest = |heap: &OrderHeap| -> Vec<RestingOrder> {
            heap.orders_by_priority()
                .into_iter()
                .map(RestingOrder::from)
                .collect()
        };
        BookSnapshot {
            asset: self.asset.to_string(),
            bids: rest(&self.buy_orders),
            asks: rest(&self.sell_orders),
        }
    }
}

/// 挂单快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestingOrder {
    pub user_id: String,
    pub price: f64,
    pub amount: u64,
    pub sequence: u64,
}

impl From<Order> for RestingOrder {
    fn from(order: Order) -> Self {
        RestingOrder {
            user_id: order.user_id.to_string(),
            price: order.price,
            amount: order.amount,
            sequence: order.sequence,
        }
    }
}

/// Point-in-time copy of a book, each side in matching priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub asset: String,
    pub bids: Vec<RestingOrder>,
    pub asks: Vec<RestingOrder>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|o| o.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|o| o.price)
    }

    pub fn bid_volume(&self) -> u128 {
        self.bids.iter().map(|o| u128::from(o.amount)).sum()
    }

    pub fn ask_volume(&self) -> u128 {
        self.asks.iter().map(|o| u128::from(o.amount)).sum()
    }
}
