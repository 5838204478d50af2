//! HTTP Observability Server
//!
//! ## 端点
//! - `GET /metrics` - Prometheus格式的指标
//! - `GET /health` - 健康状态与引擎概况
//! - `GET /health/ready` - 就绪检查

use super::health::HealthChecker;
use crate::engine::MatchingEngine;
use crate::shared::metrics::METRICS;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
struct AppState {
    engine: Arc<MatchingEngine>,
    health: Arc<HealthChecker>,
}

/// 可观测性服务器
pub struct ObservabilityServer {
    addr: SocketAddr,
    state: AppState,
}

impl ObservabilityServer {
    pub fn new(addr: SocketAddr, engine: Arc<MatchingEngine>) -> Self {
        Self {
            addr,
            state: AppState {
                engine,
                health: Arc::new(HealthChecker::new(env!("CARGO_PKG_VERSION"))),
            },
        }
    }

    pub fn health_checker(&self) -> Arc<HealthChecker> {
        self.state.health.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/health/ready", get(readiness_handler))
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> std::io::Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        info!("可观测性服务器启动于 {}", listener.local_addr()?);
        axum::serve(listener, app).await
    }
}

async fn metrics_handler() -> Response {
    (StatusCode::OK, METRICS.export()).into_response()
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let response = state.health.check(Some(&state.engine));
    (StatusCode::OK, Json(response)).into_response()
}

async fn readiness_handler(State(state): State<AppState>) -> Response {
    if state.health.is_ready() {
        StatusCode::OK.into_response()
    } else {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::health::HealthStatus;

    fn state() -> AppState {
        AppState {
            engine: Arc::new(MatchingEngine::new()),
            health: Arc::new(HealthChecker::new("test")),
        }
    }

    #[tokio::test]
    async fn test_metrics_handler_ok() {
        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_handler_ok() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_follows_status() {
        let state = state();
        assert_eq!(readiness_handler(State(state.clone())).await.status(), StatusCode::OK);

        state.health.set_status(HealthStatus::Draining);
        assert_eq!(
            readiness_handler(State(state)).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
