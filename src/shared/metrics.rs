//! Prometheus Metrics Module
//!
//! 撮合引擎的核心指标
//!
//! ## 指标类型
//! - **Counter**: 订单数、拒单数、成交数、成交量
//! - **Histogram**: 撮合延迟
//! - **Gauge**: 订单簿深度、活跃连接数
//!
//! ## 使用示例
//! ```rust,ignore
//! use auction_engine::shared::metrics::METRICS;
//!
//! METRICS.orders_total.with_label_values(&["buy", "BTC"]).inc();
//!
//! let timer = METRICS.matching_duration.with_label_values(&["BTC"]).start_timer();
//! // ... 执行撮合 ...
//! timer.observe_duration();
//! ```

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

lazy_static! {
    /// 全局Metrics实例
    pub static ref METRICS: Metrics = Metrics::new();
}

/// 撮合引擎核心指标
pub struct Metrics {
    /// Accepted orders, by side and asset
    pub orders_total: CounterVec,

    /// Rejected submissions, by validation reason
    pub orders_rejected_total: CounterVec,

    /// Trades executed, by asset
    pub trades_total: CounterVec,

    /// Matched quantity, by asset
    pub matched_volume_total: CounterVec,

    /// Time from acquiring a book lock to releasing it for one submission, lock wait excluded (seconds)
    pub matching_duration: HistogramVec,

    /// Resting orders, by asset and side
    pub orderbook_depth: GaugeVec,

    /// Connected clients
    pub active_connections: GaugeVec,

    /// Transport-level failures, by kind
    pub errors_total: CounterVec,
}

impl Metrics {
    // Registration only fails on a duplicate name, which `lazy_static`
    // rules out.
    fn new() -> Self {
        Self {
            orders_total: register_counter_vec!(
                "auction_engine_orders_total",
                "Total number of accepted orders",
                &["side", "asset"]
            )
            .unwrap(),

            orders_rejected_total: register_counter_vec!(
                "auction_engine_orders_rejected_total",
                "Total number of rejected order submissions",
                &["reason"]
            )
            .unwrap(),

            trades_total: register_counter_vec!(
                "auction_engine_trades_total",
                "Total number of trades executed",
                &["asset"]
            )
            .unwrap(),

            matched_volume_total: register_counter_vec!(
                "auction_engine_matched_volume_total",
                "Total quantity matched",
                &["asset"]
            )
            .unwrap(),

            matching_duration: register_histogram_vec!(
                "auction_engine_matching_duration_seconds",
                "Push and match time under the book lock, excluding lock wait",
                &["asset"],
                vec![1e-6, 5e-6, 1e-5, 5e-5, 1e-4, 5e-4, 1e-3, 5e-3]
            )
            .unwrap(),

            orderbook_depth: register_gauge_vec!(
                "auction_engine_orderbook_depth",
                "Current number of resting orders",
                &["asset", "side"]
            )
            .unwrap(),

            active_connections: register_gauge_vec!(
                "auction_engine_active_connections",
                "Number of active client connections",
                &["transport"]
            )
            .unwrap(),

            errors_total: register_counter_vec!(
                "auction_engine_errors_total",
                "Total number of transport errors",
                &["error_type"]
            )
            .unwrap(),
        }
    }

    /// 导出Prometheus格式的指标
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
