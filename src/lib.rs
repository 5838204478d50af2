// 全局内存分配器：使用 jemalloc
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

pub mod config;
pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod network;
pub mod observability;
pub mod protocol;
pub mod shared;

pub use config::{EngineConfig, ServerConfig};
pub use domain::{
    BookSnapshot, Order, OrderBook, OrderHeap, PricingPolicy, RestingOrder, Trade,
    ValidationConfig, ValidationError,
};
pub use engine::{MatchingEngine, SharedBook};
pub use network::{ServerError, TradeDispatcher};
pub use protocol::{ClientMessage, NewOrderRequest, ServerMessage, Side, TradeNotification};
