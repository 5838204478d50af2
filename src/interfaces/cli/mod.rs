//! CLI Interface Module
//!
//! Parses arguments, sets up logging, then runs the order entry server and
//! the observability server until Ctrl-C.

use crate::config::{EngineConfig, ServerConfig};
use crate::domain::pricing::PricingPolicy;
use crate::domain::validation::ValidationConfig;
use crate::engine::MatchingEngine;
use crate::network::{self, ServerError};
use crate::observability::{HealthChecker, HealthStatus, ObservabilityServer};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 撮合引擎命令行配置
#[derive(Parser, Debug, Clone)]
#[command(name = "auction-engine")]
#[command(version)]
#[command(about = "连续双边拍卖撮合引擎", long_about = None)]
pub struct CliConfig {
    /// 服务器监听地址
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// 订单接入端口
    #[arg(short, long, default_value_t = 5001)]
    pub port: u16,

    /// `/metrics` 与 `/health` 端口
    #[arg(short = 'm', long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// 不启动可观测性HTTP服务
    #[arg(long, default_value_t = false)]
    pub no_metrics: bool,

    /// 成交价规则
    #[arg(long, default_value = "sell-side", value_parser = ["sell-side", "maker"])]
    pub pricing: String,

    /// 最低限价（含）
    #[arg(long, default_value_t = 0.0)]
    pub min_price: f64,

    /// 最高限价
    #[arg(long)]
    pub max_price: Option<f64>,

    /// 单笔最大数量
    #[arg(long)]
    pub max_amount: Option<u64>,

    /// 允许交易的资产，可重复；为空时不限制
    #[arg(long = "asset")]
    pub allowed_assets: Vec<String>,

    /// 成交广播缓冲大小
    #[arg(long, default_value_t = 1024)]
    pub broadcast_capacity: usize,

    /// 关闭时的排空宽限期（秒）
    #[arg(long, default_value_t = 5)]
    pub drain_secs: u64,

    /// 日志级别
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// 仅显示配置不启动服务器
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn engine_config(&self) -> Result<EngineConfig, ServerError> {
        let pricing: PricingPolicy = self.pricing.parse().map_err(ServerError::Config)?;

        let defaults = ValidationConfig::default();
        let validation = ValidationConfig {
            min_price: self.min_price,
            max_price: self.max_price.unwrap_or(defaults.max_price),
            max_amount: self.max_amount.unwrap_or(defaults.max_amount),
            allowed_assets: self.allowed_assets.iter().map(|a| Arc::from(a.as_str())).collect(),
        };
        if validation.min_price < 0.0 || validation.min_price >= validation.max_price {
            return Err(ServerError::Config(format!(
                "price range [{}, {}] is empty",
                validation.min_price, validation.max_price
            )));
        }
        if validation.max_amount == 0 {
            return Err(ServerError::Config("max amount must be positive".to_string()));
        }

        Ok(EngineConfig { pricing, validation })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: SocketAddr::new(self.host, self.port),
            metrics_addr: (!self.no_metrics).then(|| SocketAddr::new(self.host, self.metrics_port)),
            broadcast_capacity: self.broadcast_capacity,
            drain_grace: Duration::from_secs(self.drain_secs),
            ..ServerConfig::default()
        }
    }
}

/// Runs the CLI application
pub async fn run() -> Result<(), ServerError> {
    let cli = CliConfig::parse();
    init_logging(&cli.log_level);

    let engine_config = cli.engine_config()?;
    let server_config = cli.server_config();

    println!("========================================");
    println!("  连续双边拍卖撮合引擎 v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("订单接入:     {}", server_config.listen_addr);
    match server_config.metrics_addr {
        Some(addr) => println!("可观测性:     http://{}", addr),
        None => println!("可观测性:     禁用"),
    }
    println!("成交价规则:   {}", engine_config.pricing);
    println!("日志级别:     {}", cli.log_level);
    println!("========================================");

    if cli.dry_run {
        println!("\nDry-run 模式 - 不启动服务器");
        return Ok(());
    }

    let engine = Arc::new(MatchingEngine::with_config(engine_config));

    let health = match server_config.metrics_addr {
        Some(addr) => {
            let server = ObservabilityServer::new(addr, engine.clone());
            let health = server.health_checker();
            tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    error!("可观测性服务器错误: {}", e);
                }
            });
            Some(health)
        }
        None => None,
    };

    info!("撮合引擎启动");
    // 监听器随 run_server 的 future 一起释放，之后不再接受新连接
    tokio::select! {
        result = network::run_server(&server_config, engine.clone()) => return result,
        _ = tokio::signal::ctrl_c() => info!("收到关闭信号"),
    }

    drain(health.as_deref(), server_config.drain_grace).await;
    info!(books = engine.book_count(), "撮合引擎已停止");
    Ok(())
}

/// Marks the process as draining and keeps the runtime alive for `grace`,
/// so open connections and the HTTP endpoints keep being served.
async fn drain(health: Option<&HealthChecker>, grace: Duration) {
    if let Some(health) = health {
        health.set_status(HealthStatus::Draining);
    }
    info!(grace_secs = grace.as_secs_f64(), "停止接受新连接，排空中");
    tokio::time::sleep(grace).await;
}

/// 初始化日志系统
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_default() {
        let config = CliConfig::parse_from(["auction-engine"]);
        assert_eq!(config.port, 5001);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.pricing, "sell-side");
        assert_eq!(config.log_level, "info");
        assert!(config.allowed_assets.is_empty());
        assert!(!config.dry_run);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine, EngineConfig::default());
        assert_eq!(config.server_config(), ServerConfig {
            listen_addr: "127.0.0.1:5001".parse().unwrap(),
            ..ServerConfig::default()
        });
    }

    #[test]
    fn test_cli_config_custom() {
        let config = CliConfig::parse_from([
            "auction-engine",
            "--host", "0.0.0.0",
            "--port", "7000",
            "--no-metrics",
            "--pricing", "maker",
            "--max-price", "1000",
            "--max-amount", "50",
            "--asset", "BTC",
            "--asset", "ETH",
            "--dry-run",
        ]);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.pricing, PricingPolicy::Maker);
        assert_eq!(engine.validation.max_price, 1000.0);
        assert_eq!(engine.validation.max_amount, 50);
        assert_eq!(engine.validation.allowed_assets.len(), 2);

        let server = config.server_config();
        assert_eq!(server.listen_addr, "0.0.0.0:7000".parse::<SocketAddr>().unwrap());
        assert!(server.metrics_addr.is_none());
        assert!(config.dry_run);
    }

    #[test]
    fn test_drain_grace_from_cli() {
        let config = CliConfig::parse_from(["auction-engine", "--drain-secs", "0"]);
        assert_eq!(config.server_config().drain_grace, Duration::ZERO);
        assert_eq!(
            CliConfig::parse_from(["auction-engine"]).server_config().drain_grace,
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn test_drain_reports_not_ready_during_grace() {
        let health = Arc::new(HealthChecker::new("test"));
        let draining = {
            let health = health.clone();
            tokio::spawn(async move { drain(Some(&health), Duration::from_millis(200)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(health.status(), HealthStatus::Draining);
        assert!(!health.is_ready());
        assert!(!draining.is_finished());

        draining.await.unwrap();
    }

    #[test]
    fn test_invalid_pricing_rejected_by_parser() {
        assert!(CliConfig::try_parse_from(["auction-engine", "--pricing", "mid"]).is_err());
    }

    #[test]
    fn test_empty_price_range_is_config_error() {
        let config = CliConfig::parse_from([
            "auction-engine",
            "--min-price", "10",
            "--max-price", "5",
        ]);
        assert!(matches!(config.engine_config(), Err(ServerError::Config(_))));
    }
}
