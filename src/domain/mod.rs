//! Domain Layer - Core Business Logic
//!
//! Pure in-memory matching logic with no I/O. Everything in here is driven
//! by `MatchingEngine`, which owns the locking.
//!
//! ## Modules
//! - `order`: the resting `Order` and the emitted `Trade`
//! - `orderbook`: per-side priority queues and the per-asset book
//! - `pricing`: which price a match executes at
//! - `validation`: boundary checks applied before an order reaches a book

pub mod order;
pub mod orderbook;
pub mod pricing;
pub mod validation;

pub use order::{Order, Trade};
pub use orderbook::{BookSnapshot, OrderBook, OrderHeap, RestingOrder};
pub use pricing::PricingPolicy;
pub use validation::{OrderValidator, ValidatedOrder, ValidationConfig, ValidationError};
