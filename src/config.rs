//! Runtime configuration for the engine and the servers around it.
//!
//! Library users and tests build these directly; the binary fills them from
//! `interfaces::cli::CliConfig`.

use crate::domain::pricing::PricingPolicy;
use crate::domain::validation::ValidationConfig;
use std::net::SocketAddr;
use std::time::Duration;

/// Matching engine settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Execution price rule
    pub pricing: PricingPolicy,

    /// Boundary checks applied by `submit`
    pub validation: ValidationConfig,
}

/// Network and observability settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Order entry listener
    pub listen_addr: SocketAddr,

    /// HTTP `/metrics` and `/health` listener; `None` disables it
    pub metrics_addr: Option<SocketAddr>,

    /// Trade broadcast buffer per subscriber before it starts lagging
    pub broadcast_capacity: usize,

    /// Largest accepted frame in bytes
    pub max_frame_len: usize,

    /// After shutdown starts: no new connections, `/health/ready` reports
    /// draining, open connections keep being served for this long
    pub drain_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5001)),
            metrics_addr: Some(SocketAddr::from(([127, 0, 0, 1], 9090))),
            broadcast_capacity: 1024,
            max_frame_len: 64 * 1024,
            drain_grace: Duration::from_secs(5),
        }
    }
}
