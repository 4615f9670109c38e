//! Coordinator binary

use anyhow::Result;
use clap::Parser;
use minidfs::{ClusterConfig, Coordinator};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minidfs-coord")]
#[command(about = "minidfs coordinator - fragments, replicates and reassembles files")]
#[command(version)]
struct Cli {
    /// Cluster config file (key=value)
    #[arg(long, default_value = "cluster.conf")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClusterConfig::load(&cli.config)?;

    // Startup is the only fatal path: fewer reachable nodes than
    // node.min_reachable exits the process here.
    Coordinator::new(config).serve().await?;
    Ok(())
}
