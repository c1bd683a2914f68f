mod config;
mod error;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use advisor_common::advisor::ProductAdvisor;
use advisor_common::openai::OpenAiClient;
use advisor_common::store::SearchStore;

use config::Config;
use server::ProductAdvisorServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries MCP JSON-RPC, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting product-advisor MCP server");

    let config = Config::from_env()?;
    info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        api_key = config.llm.api_key.is_some(),
        timeout_ms = config.llm.timeout.map(|t| t.as_millis() as u64),
        "llm client configured"
    );

    let catalog = Arc::new(config.load_catalog()?);
    info!(
        products = catalog.len(),
        source = %config
            .catalog_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "bundled".to_string()),
        "catalog ready"
    );

    let generator = Arc::new(OpenAiClient::new(config.llm.clone())?);
    let store = Arc::new(RwLock::new(SearchStore::new()));
    let advisor = Arc::new(ProductAdvisor::new(catalog, generator, store));
    let server = ProductAdvisorServer::new(advisor);

    if let Some(addr) = &config.tcp_listen_addr {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
