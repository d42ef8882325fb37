//! mcp-alphafold server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use foldmcp_client::{AlphaFoldClient, ApiClient, UniProtClient};
use foldmcp_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let cache_path = config.cache_db_path();
    let cache = Arc::new(
        CacheDb::open(&cache_path)
            .await
            .with_context(|| format!("failed to open cache at {}", cache_path.display()))?,
    );

    match cache.purge_expired().await {
        Ok(0) => {}
        Ok(n) => tracing::info!("purged {} expired cache entries", n),
        Err(e) => tracing::warn!("failed to purge expired cache entries: {}", e),
    }

    let api = ApiClient::from_config(&config, cache.clone())?;
    let alphafold = AlphaFoldClient::new(api.clone(), &config.alphafold_base_url);
    let uniprot = UniProtClient::new(api, &config.uniprot_base_url);

    tracing::info!(cache = %cache_path.display(), "Starting mcp-alphafold server on stdio transport");

    let handler = handler::AlphaFoldServer::new(alphafold, uniprot, cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
