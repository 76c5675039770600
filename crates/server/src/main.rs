//! fitshell server entry point.
//!
//! Loads configuration, brings the offline cache up (install, then activate)
//! and serves the cache tools over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use fitshell_client::{CacheController, FetchClient, FetchConfig, Manifest};
use fitshell_core::{AppConfig, CacheStorage};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin_url()?;
    let version = config.cache_version()?;
    let manifest = Manifest::resolve(&origin, config.manifest.as_slice())?;

    tracing::info!(
        origin = %origin,
        version = %version,
        db_path = %config.db_path.display(),
        "starting fitshell server on stdio transport"
    );

    let storage = CacheStorage::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config)?)?);
    let controller = Arc::new(CacheController::new(storage, network, version, manifest));
    let handle = Arc::clone(&controller).spawn(64);

    match handle.install().await {
        Ok(()) => {
            if let Err(e) = handle.activate().await {
                tracing::warn!(error = %e, "activation failed; fetches go to the network");
            }
        }
        Err(e) => tracing::warn!(error = %e, "install failed; fetches go to the network"),
    }

    let server = handler::FitshellServer::new(controller, handle, origin);
    let server = serve_server(server, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
