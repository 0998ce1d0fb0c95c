//! TCP Chat Server - Entry Point
//!
//! Starts the listener and serves chat sessions.

use std::env;

use tracing_subscriber::EnvFilter;

use linechat::ChatServer;

/// Default listen address
const DEFAULT_ADDR: &str = "127.0.0.1:3333";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=linechat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linechat=info")),
        )
        .init();

    // Get listen address from command line or use default
    let addr = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = ChatServer::bind(&addr).await?;
    server.run().await;

    Ok(())
}
