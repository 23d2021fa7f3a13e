mod catalog;
mod config;
mod download;
mod server;
mod store;

// Logging
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let cli = <cli::Cli as clap::Parser>::parse();
    let config = Config::resolve(cli)?;
    tracing::debug!("Resolved config: {:?}", config);

    server::run(config).await
}
