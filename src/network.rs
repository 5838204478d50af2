//! 订单接入与成交分发
//!
//! TCP server speaking length-delimited JSON frames (`protocol`). Each
//! connection:
//! - decodes `new_order` frames and hands them to `MatchingEngine::submit`
//! - answers the submitter with `order_received` or `order_rejected`
//! - forwards every `order_matched` event published by any connection
//!
//! The engine only ever returns trades; publishing them to the broadcast
//! channel happens here, after the book lock has been released.

use crate::config::ServerConfig;
use crate::engine::MatchingEngine;
use crate::protocol::{
    ClientMessage, OrderReceived, OrderRejected, ServerMessage, TradeNotification,
};
use crate::shared::metrics::METRICS;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Fans encoded trade frames out to every connection.
#[derive(Clone)]
pub struct TradeDispatcher {
    tx: broadcast::Sender<Bytes>,
}

impl TradeDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }

    /// Publishes one frame per notification. Having no subscribers is not an
    /// error.
    pub fn publish(&self, trades: &[TradeNotification]) -> Result<(), ServerError> {
        for trade in trades {
            let frame = encode(&ServerMessage::OrderMatched(trade.clone()))?;
            let _ = self.tx.send(frame);
        }
        Ok(())
    }
}

pub fn encode(message: &ServerMessage) -> Result<Bytes, ServerError> {
    Ok(Bytes::from(serde_json::to_vec(message)?))
}

/// Binds `config.listen_addr` and serves until the listener fails.
pub async fn run_server(
    config: &ServerConfig,
    engine: Arc<MatchingEngine>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    serve(listener, engine, config).await
}

/// Accept loop over an already bound listener.
pub async fn serve(
    listener: TcpListener,
    engine: Arc<MatchingEngine>,
    config: &ServerConfig,
) -> Result<(), ServerError> {
    let dispatcher = TradeDispatcher::new(config.broadcast_capacity);
    let max_frame_len = config.max_frame_len;
    info!("服务器正在监听: {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "接受新连接");

        let engine = engine.clone();
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            METRICS.active_connections.with_label_values(&["tcp"]).inc();
            if let Err(e) = handle_connection(stream, peer, engine, dispatcher, max_frame_len).await {
                METRICS.errors_total.with_label_values(&["connection"]).inc();
                warn!(%peer, "connection closed with error: {}", e);
            }
            METRICS.active_connections.with_label_values(&["tcp"]).dec();
            debug!(%peer, "连接已关闭");
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    engine: Arc<MatchingEngine>,
    dispatcher: TradeDispatcher,
    max_frame_len: usize,
) -> Result<(), ServerError> {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_len)
        .new_codec();
    let mut framed = Framed::new(stream, codec);
    let mut trades_rx = dispatcher.subscribe();

    loop {
        tokio::select! {
            frame = framed.next() => {
                let data = match frame {
                    Some(Ok(data)) => data,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                };
                let (reply, trades) = process_frame(&engine, &data, peer);
                framed.send(encode(&reply)?).await?;
                dispatcher.publish(&trades)?;
            }
            published = trades_rx.recv() => {
                match published {
                    Ok(frame) => framed.send(frame).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        METRICS.errors_total.with_label_values(&["lagged"]).inc();
                        warn!(%peer, skipped, "client too slow, dropped trade notifications");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}

/// Decodes one client frame and runs it through the engine.
///
/// Returns the direct reply for the submitter and the trades to broadcast.
fn process_frame(
    engine: &MatchingEngine,
    data: &[u8],
    peer: SocketAddr,
) -> (ServerMessage, Vec<TradeNotification>) {
    let request = match serde_json::from_slice::<ClientMessage>(data) {
        Ok(ClientMessage::NewOrder(request)) => request,
        Err(e) => {
            METRICS.errors_total.with_label_values(&["malformed"]).inc();
            warn!(%peer, "无法解析的请求: {}", e);
            let reply = OrderRejected::new("malformed_request", e.to_string());
            return (ServerMessage::OrderRejected(reply), Vec::new());
        }
    };

    match engine.submit(&request) {
        Ok(trades) => {
            let notifications: Vec<TradeNotification> =
                trades.iter().map(TradeNotification::from).collect();
            let reply = OrderReceived {
                status: "success".to_string(),
                user_id: request.user_id,
                asset: request.asset,
                matched: notifications.len(),
            };
            (ServerMessage::OrderReceived(reply), notifications)
        }
        Err(e) => (
            ServerMessage::OrderRejected(OrderRejected::from(&e)),
            Vec::new(),
        ),
    }
}
