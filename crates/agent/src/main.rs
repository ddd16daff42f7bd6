//! offcache server entry point.
//!
//! Boots the interception and cache manager and serves its lifecycle events
//! as MCP tools on stdio. Logging goes to stderr to avoid interfering with
//! the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offcache_client::{FetchClient, FetchConfig};
use offcache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;
mod worker;

use worker::{RecordingHost, ServiceWorker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_name = %config.cache_name,
        scope = %config.scope_url,
        db = %config.db_path.display(),
        "Starting offcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let host = Arc::new(RecordingHost::new());
    let worker = ServiceWorker::new(&config, db.clone(), Arc::new(network), host.clone())?;

    let handler = handler::OffcacheServer::new(Arc::new(worker), host);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    db.close().await?;

    Ok(())
}
