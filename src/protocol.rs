//! Wire protocol shared by the server and its clients.
//!
//! Frames are length-delimited JSON documents tagged with an `event` name,
//! e.g. `{"event":"new_order","data":{...}}`.

use crate::domain::order::Trade;
use crate::domain::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    /// Only `buy` and `sell` are accepted (ASCII case-insensitive); anything
    /// else is rejected rather than being read as a sell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("buy") {
            Ok(Side::Buy)
        } else if s.eq_ignore_ascii_case("sell") {
            Ok(Side::Sell)
        } else {
            Err(ValidationError::UnknownSide(s.to_string()))
        }
    }
}

/// 新订单请求，由客户端发起
///
/// Fields are kept in their raw decoded form; `MatchingEngine::submit`
/// validates them before anything touches a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub user_id: String,
    pub asset: String,
    pub order_type: String,
    pub price: f64,
    pub amount: i64,
}

impl NewOrderRequest {
    pub fn limit(
        user_id: impl Into<String>,
        asset: impl Into<String>,
        side: Side,
        price: f64,
        amount: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            asset: asset.into(),
            order_type: side.as_str().to_string(),
            price,
            amount,
        }
    }

    pub fn buy(user_id: impl Into<String>, asset: impl Into<String>, price: f64, amount: i64) -> Self {
        Self::limit(user_id, asset, Side::Buy, price, amount)
    }

    pub fn sell(user_id: impl Into<String>, asset: impl Into<String>, price: f64, amount: i64) -> Self {
        Self::limit(user_id, asset, Side::Sell, price, amount)
    }
}

/// 下单确认，只发给下单的连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceived {
    pub status: String,
    pub user_id: String,
    pub asset: String,
    /// Number of trades the order produced on arrival.
    pub matched: usize,
}

/// 拒单回报
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub status: String,
    pub reason: String,
    pub message: String,
}

impl OrderRejected {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "rejected".to_string(),
            reason: reason.into(),
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for OrderRejected {
    fn from(err: &ValidationError) -> Self {
        Self::new(err.reason(), err.to_string())
    }
}

/// 成交回报，广播给所有连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeNotification {
    pub status: String,
    pub trade_id: u64,
    pub asset: String,
    pub buyer: String,
    pub seller: String,
    pub matched_amount: u64,
    pub price: f64,
    pub aggressor: Side,
    pub timestamp: u64,
}

impl From<&Trade> for TradeNotification {
    fn from(trade: &Trade) -> Self {
        Self {
            status: "success".to_string(),
            trade_id: trade.trade_id,
            asset: trade.asset.to_string(),
            buyer: trade.buyer.to_string(),
            seller: trade.seller.to_string(),
            matched_amount: trade.matched_amount,
            price: trade.price,
            aggressor: trade.aggressor,
            timestamp: trade.timestamp,
        }
    }
}

/// 客户端发送给服务器的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    NewOrder(NewOrderRequest),
}

/// 服务器发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    OrderReceived(OrderReceived),
    OrderRejected(OrderRejected),
    OrderMatched(TradeNotification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!(matches!(
            "bid".parse::<Side>(),
            Err(ValidationError::UnknownSide(s)) if s == "bid"
        ));
        assert!("".parse::<Side>().is_err());
    }

    #[test]
    fn test_client_message_wire_format() {
        let raw = r#"{"event":"new_order","data":{"user_id":"user1","asset":"Asset1","order_type":"buy","price":10.5,"amount":60}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        let ClientMessage::NewOrder(order) = msg;
        assert_eq!(order, NewOrderRequest::buy("user1", "Asset1", 10.5, 60));
    }

    #[test]
    fn test_server_message_tagging() {
        let msg = ServerMessage::OrderRejected(OrderRejected::new("invalid_amount", "amount must be positive"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "order_rejected");
        assert_eq!(json["data"]["reason"], "invalid_amount");
    }
}
