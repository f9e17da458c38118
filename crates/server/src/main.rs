//! swkit server entry point.
//!
//! Boots the worker core and serves its event surface as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swkit_client::{FetchConfig, HttpNetwork};
use swkit_core::{AppConfig, CacheDb, ServiceWorkerCore};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod keepalive;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version_tag, origin = %config.origin, "starting swkit on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let core = ServiceWorkerCore::new(&config, db, Arc::new(network))?;

    let handler = handler::SwServer::new(Arc::new(core), config.origin_url()?);
    let keepalive = handler.keepalive();
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    keepalive.drain().await;

    Ok(())
}
