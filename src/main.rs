//! PDF Link Miner - Entry point
//!
//! MCP server over stdio. Settings come from `PDF_LINK_MINER_*` variables.

use pdf_link_miner::{run_server_with_config, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_link_miner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        resource_dirs = config.resource_dirs.len(),
        parallel = config.analysis.parallel,
        "Starting PDF link miner"
    );

    run_server_with_config(config).await
}
