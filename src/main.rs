//! Thin wrapper around `interfaces::cli`.

use auction_engine::interfaces::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("auction-engine: {}", e);
        std::process::exit(1);
    }
}
