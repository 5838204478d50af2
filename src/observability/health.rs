//! Health Check
//!
//! ## 响应格式
//! ```json
//! {
//!   "status": "healthy",
//!   "uptime_seconds": 3600,
//!   "version": "0.1.0",
//!   "timestamp": 1234567890,
//!   "engine": { "books": 2, "assets": ["BTC", "ETH"], "pricing": "sell-side" }
//! }
//! ```

use crate::engine::MatchingEngine;
use crate::shared::timestamp::now_secs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// 正在关闭：不再接受新连接，已有连接在宽限期内继续服务
    Draining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub version: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineDetails>,
}

/// Engine state included in `/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDetails {
    pub books: usize,
    pub assets: Vec<String>,
    pub pricing: String,
}

impl EngineDetails {
    pub fn from_engine(engine: &MatchingEngine) -> Self {
        Self {
            books: engine.book_count(),
            assets: engine.assets().iter().map(|a| a.to_string()).collect(),
            pricing: engine.pricing().to_string(),
        }
    }
}

/// 健康检查器
pub struct HealthChecker {
    started: Instant,
    status: RwLock<HealthStatus>,
    version: String,
}

impl HealthChecker {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            status: RwLock::new(HealthStatus::Healthy),
            version: version.into(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn set_status(&self, status: HealthStatus) {
        *self.status.write() = status;
    }

    pub fn status(&self) -> HealthStatus {
        *self.status.read()
    }

    pub fn check(&self, engine: Option<&MatchingEngine>) -> HealthResponse {
        HealthResponse {
            status: self.status(),
            uptime_seconds: self.uptime_seconds(),
            version: self.version.clone(),
            timestamp: now_secs(),
            engine: engine.map(EngineDetails::from_engine),
        }
    }

    /// 就绪检查：只有 Healthy 时接受流量
    pub fn is_ready(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NewOrderRequest;

    #[test]
    fn test_status_change() {
        let checker = HealthChecker::new("1.0.0");
        assert_eq!(checker.status(), HealthStatus::Healthy);
        assert!(checker.is_ready());

        checker.set_status(HealthStatus::Draining);
        assert_eq!(checker.status(), HealthStatus::Draining);
        assert!(!checker.is_ready());
    }

    #[test]
    fn test_health_response_with_engine() {
        let engine = MatchingEngine::new();
        engine.submit(&NewOrderRequest::buy("u", "ETH", 10.0, 1)).unwrap();
        engine.submit(&NewOrderRequest::buy("u", "BTC", 10.0, 1)).unwrap();

        let checker = HealthChecker::new("1.0.0");
        let response = checker.check(Some(&engine));

        assert_eq!(response.version, "1.0.0");
        assert!(response.timestamp > 0);
        let details = response.engine.unwrap();
        assert_eq!(details.books, 2);
        assert_eq!(details.assets, vec!["BTC".to_string(), "ETH".to_string()]);
        assert_eq!(details.pricing, "sell-side");
    }

    #[test]
    fn test_serialization() {
        let response = HealthChecker::new("1.0.0").check(None);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("engine"));
    }
}
