//! Storage node binary

use anyhow::Result;
use clap::Parser;
use minidfs::NodeServer;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minidfs-node")]
#[command(about = "minidfs storage node - flat fragment store over TCP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    listen: u16,

    /// Data directory (defaults to ./data/node-<port>)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Buffer size for relaying byte streams
    #[arg(long, default_value = "1024")]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let data_dir = args
        .data
        .unwrap_or_else(|| PathBuf::from(format!("./data/node-{}", args.listen)));

    NodeServer::new(args.listen, data_dir, args.chunk_size)
        .serve()
        .await?;
    Ok(())
}
