use crate::protocol::Side;
use std::sync::Arc;

/// 订单簿中的一个挂单
///
/// Identity fields never change once the order is in a heap; only `amount`
/// is decremented as the order is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub user_id: Arc<str>,
    pub asset: Arc<str>,
    pub side: Side,
    pub price: f64,
    /// Remaining quantity, always > 0 while resting.
    pub amount: u64,
    /// Arrival sequence assigned by the engine, used for time priority.
    pub sequence: u64,
}

impl Order {
    pub fn new(
        user_id: Arc<str>,
        asset: Arc<str>,
        side: Side,
        price: f64,
        amount: u64,
        sequence: u64,
    ) -> Self {
        Order {
            user_id,
            asset,
            side,
            price,
            amount,
            sequence,
        }
    }

    /// Reduces the remaining amount by `qty`.
    #[inline]
    pub fn fill(&mut self, qty: u64) {
        debug_assert!(qty <= self.amount, "fill {} exceeds remaining {}", qty, self.amount);
        self.amount -= qty;
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.amount == 0
    }
}

/// 一笔成交
///
/// Produced by the matching loop and handed back to the caller of
/// `submit`; the engine keeps no record of it. `trade_id` and `timestamp`
/// are stamped by the engine after the book has produced the match.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub trade_id: u64,
    pub asset: Arc<str>,
    pub buyer: Arc<str>,
    pub seller: Arc<str>,
    pub matched_amount: u64,
    pub price: f64,
    pub buy_sequence: u64,
    pub sell_sequence: u64,
    /// Side of the order whose arrival triggered the match.
    pub aggressor: Side,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_reduces_amount() {
        let mut order = Order::new(Arc::from("u1"), Arc::from("BTC"), Side::Buy, 100.0, 10, 1);
        order.fill(4);
        assert_eq!(order.amount, 6);
        assert!(!order.is_filled());
        order.fill(6);
        assert!(order.is_filled());
    }
}
