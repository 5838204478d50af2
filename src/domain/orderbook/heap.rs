//! 单边订单优先队列
//!
//! A binary heap ranked by price-time priority:
//! - 买单: higher price first, then earlier sequence
//! - 卖单: lower price first, then earlier sequence
//!
//! The remaining amount is not part of the ranking key, so the best order
//! can be filled in place through `peek_best_mut` without disturbing the heap.

use crate::domain::order::Order;
use crate::protocol::Side;
use std::cmp::Ordering;
use std::collections::binary_heap::{BinaryHeap, PeekMut};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone)]
struct Ranked(Order);

impl Ord for Ranked {
    // BinaryHeap pops the greatest element, so Greater means "matches first".
    fn cmp(&self, other: &Self) -> Ordering {
        let by_price = match self.0.side {
            Side::Buy => self.0.price.total_cmp(&other.0.price),
            Side::Sell => other.0.price.total_cmp(&self.0.price),
        };
        by_price.then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Priority queue holding the resting orders of one side of one book.
#[derive(Debug, Clone)]
pub struct OrderHeap {
    side: Side,
    heap: BinaryHeap<Ranked>,
}

impl OrderHeap {
    pub fn new(side: Side) -> Self {
        OrderHeap {
            side,
            heap: BinaryHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// O(log n). Only validated orders with a positive amount may be pushed.
    pub fn push(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side, "order pushed onto the wrong side");
        debug_assert!(order.amount > 0, "zero-amount order pushed onto a heap");
        self.heap.push(Ranked(order));
    }

    pub fn peek_best(&self) -> Option<&Order> {
        self.heap.peek().map(|ranked| &ranked.0)
    }

    /// Mutable handle to the best order, used by the matching loop to fill
    /// it in place and pop it once exhausted.
    pub fn peek_best_mut(&mut self) -> Option<BestOrder<'_>> {
        self.heap.peek_mut().map(BestOrder)
    }

    /// O(log n)
    pub fn pop_best(&mut self) -> Option<Order> {
        self.heap.pop().map(|ranked| ranked.0)
    }

    /// Sum of the remaining amounts of every resting order. Widened so that
    /// many orders near the amount limit cannot overflow.
    pub fn total_amount(&self) -> u128 {
        self.heap.iter().map(|ranked| u128::from(ranked.0.amount)).sum()
    }

    /// Resting orders from best to worst. O(n log n), meant for snapshots.
    pub fn orders_by_priority(&self) -> Vec<Order> {
        let mut ranked: Vec<Ranked> = self.heap.iter().cloned().collect();
        ranked.sort_unstable_by(|a, b| b.cmp(a));
        ranked.into_iter().map(|r| r.0).collect()
    }
}

/// 堆顶订单的可变引用
pub struct BestOrder<'a>(PeekMut<'a, Ranked>);

impl BestOrder<'_> {
    /// Removes the best order from its heap.
    pub fn pop(this: Self) -> Order {
        PeekMut::pop(this.0).0
    }
}

impl Deref for BestOrder<'_> {
    type Target = Order;

    fn deref(&self) -> &Order {
        &(*self.0).0
    }
}

impl DerefMut for BestOrder<'_> {
    fn deref_mut(&mut self) -> &mut Order {
        &mut (*self.0).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn order(side: Side, price: f64, amount: u64, sequence: u64) -> Order {
        Order::new(Arc::from("u"), Arc::from("BTC"), side, price, amount, sequence)
    }

    #[test]
    fn test_buy_heap_highest_price_first() {
        let mut heap = OrderHeap::new(Side::Buy);
        heap.push(order(Side::Buy, 99.0, 1, 1));
        heap.push(order(Side::Buy, 101.0, 1, 2));
        heap.push(order(Side::Buy, 100.0, 1, 3));

        let prices: Vec<f64> = std::iter::from_fn(|| heap.pop_best()).map(|o| o.price).collect();
        assert_eq!(prices, vec![101.0, 100.0, 99.0]);
    }

    #[test]
    fn test_sell_heap_lowest_price_first() {
        let mut heap = OrderHeap::new(Side::Sell);
        heap.push(order(Side::Sell, 101.0, 1, 1));
        heap.push(order(Side::Sell, 99.0, 1, 2));
        heap.push(order(Side::Sell, 100.0, 1, 3));

        assert_eq!(heap.peek_best().map(|o| o.price), Some(99.0));
        let prices: Vec<f64> = heap.orders_by_priority().iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![99.0, 100.0, 101.0]);
    }

    #[test]
    fn test_equal_price_is_fifo_on_both_sides() {
        for side in [Side::Buy, Side::Sell] {
            let mut heap = OrderHeap::new(side);
            // pushed out of sequence order on purpose
            heap.push(order(side, 100.0, 1, 7));
            heap.push(order(side, 100.0, 1, 3));
            heap.push(order(side, 100.0, 1, 5));

            let seqs: Vec<u64> = std::iter::from_fn(|| heap.pop_best()).map(|o| o.sequence).collect();
            assert_eq!(seqs, vec![3, 5, 7], "side {}", side);
        }
    }

    #[test]
    fn test_fill_in_place_keeps_position() {
        let mut heap = OrderHeap::new(Side::Sell);
        heap.push(order(Side::Sell, 100.0, 10, 1));
        heap.push(order(Side::Sell, 100.0, 10, 2));

        {
            let mut best = heap.peek_best_mut().unwrap();
            best.fill(9);
        }
        let best = heap.peek_best().unwrap();
        assert_eq!((best.sequence, best.amount), (1, 1));
        assert_eq!(heap.total_amount(), 11);

        let best = heap.peek_best_mut().unwrap();
        let popped = BestOrder::pop(best);
        assert_eq!(popped.sequence, 1);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_total_amount_does_not_overflow() {
        let mut heap = OrderHeap::new(Side::Buy);
        for seq in 1..=3 {
            heap.push(order(Side::Buy, 100.0, u64::MAX, seq));
        }
        assert_eq!(heap.total_amount(), 3 * u128::from(u64::MAX));
    }

    #[test]
    fn test_empty_heap() {
        let mut heap = OrderHeap::new(Side::Buy);
        assert!(heap.is_empty());
        assert!(heap.peek_best().is_none());
        assert!(heap.peek_best_mut().is_none());
        assert!(heap.pop_best().is_none());
        assert_eq!(heap.total_amount(), 0);
    }
}
