//! Runs the chat server.
//!
//! Configuration comes from the environment (`CHAT_ADDR`, `PORT`,
//! `CHAT_MAX_CONNECTIONS`, `CHAT_MAX_REQUEST_SIZE`); log level from `RUST_LOG`.

use std::sync::Arc;

use env_logger::Env;
use log::info;

use pollchat::chat::{ChatRouter, ClientRegistry, RoomStore, HISTORY_LIMIT};
use pollchat::{adapter, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    info!(
        "Starting with max {} connections, {} byte request limit, {HISTORY_LIMIT} messages per room",
        config.max_connections, config.max_request_size
    );

    let router = ChatRouter::new(Arc::new(RoomStore::new()), Arc::new(ClientRegistry::new()));

    let server = HttpServer::new(config);
    adapter::mount(&server, router).await;
    server.start().await?;

    Ok(())
}
