//! Project file tree server - Entry Point
//!
//! Serves per-project virtual file trees over a line-delimited JSON protocol.

use log::{error, info};

use filetree_server::utils::logging::setup_logging;
use filetree_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            setup_logging("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // env_logger picks up RUST_LOG, falling back to the configured level
    setup_logging(&config.server.log_level);

    info!("Launching tree server...");

    let server = match Server::from_config(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };
    server.start().await;
}
