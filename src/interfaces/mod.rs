//! Interfaces Layer - External Entry Points
//!
//! - `cli`: 命令行入口（main.rs 逻辑）

pub mod cli;
