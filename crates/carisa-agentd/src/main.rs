mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use carisa_core::{Agent, ConfigSource, NodeConfig};
use carisa_observe::{LoggerConfig, logger_init};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (node_type, file) = Cli::parse().role.split();

    // 1) Configuration
    let source = ConfigSource::for_role(node_type, file);
    let cfg = NodeConfig::load(node_type, &source)
        .with_context(|| format!("loading {node_type} configuration"))?;

    // 2) Logger
    logger_init(&LoggerConfig::from_node_log(&cfg.log)?)?;
    info!(
        source = %source,
        config = %cfg.to_json(),
        "loaded {node_type} configuration"
    );

    // 3) Agent
    if let Err(e) = serve(&cfg).await {
        error!(id = %cfg.server.id, error = %format!("{e:#}"), "node agent aborted");
        return Err(e);
    }
    Ok(())
}

async fn serve(cfg: &NodeConfig) -> anyhow::Result<()> {
    let mut agent = Agent::from_config(cfg)
        .await
        .context("building node agent")?;
    info!("press Ctrl+C to stop");

    agent
        .run_until(shutdown_signal())
        .await
        .context("running node agent")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for interrupt signal");
            std::future::pending::<()>().await;
        }
    }
}
