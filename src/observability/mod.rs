//! Observability Module
//!
//! - `health` - 健康检查
//! - `http_server` - `/metrics` 与 `/health` HTTP端点

pub mod health;
pub mod http_server;

pub use health::{EngineDetails, HealthChecker, HealthResponse, HealthStatus};
pub use http_server::ObservabilityServer;
