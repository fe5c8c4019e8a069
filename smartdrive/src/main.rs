mod api;
mod config;
mod loops;
mod node;
mod peer;

use std::sync::Arc;

use clap::Parser;

use config::{CliOpts, Config};
use node::Node;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = CliOpts::parse();
    let config = Config::from(opts);

    let node = Arc::new(Node::bootstrap(config)?);
    tracing::info!(netuid = node.config.netuid, port = node.config.port, "starting smartdrive validator");

    tokio::spawn({
        let node = node.clone();
        async move {
            if let Err(err) = peer::listen(node).await {
                tracing::error!(error = %err, "peer transport stopped");
            }
        }
    });
    tokio::spawn(peer::discovery_loop(node.clone()));
    tokio::spawn(loops::block_loop(node.clone()));
    tokio::spawn(loops::validation_loop(node.clone()));

    let app = api::router(node.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", node.config.port)).await?;
    tracing::info!(port = node.config.port, "public API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install Ctrl+C handler");
    }
    tracing::info!("shutting down");
}
