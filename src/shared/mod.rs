//! Shared utilities used across layers
//!
//! - `metrics`: global Prometheus registry handles
//! - `timestamp`: wall-clock helpers

pub mod metrics;
pub mod timestamp;

pub use metrics::METRICS;
pub use timestamp::{now_nanos, now_secs};
