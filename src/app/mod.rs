pub mod cli;
pub mod logging;

pub use cli::{Cli, Command, EventArgs};
pub use logging::{LoggingError, LoggingSystem};

use crate::analytics::Analytics;
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Entry point of the `rask-event-shipper` binary: records one event and
/// closes the engine, waiting for the upload to finish.
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli
        .resolve_config()
        .context("Failed to resolve configuration")?;

    LoggingSystem::new(config.log_level)
        .json(cli.json_logs)
        .init()
        .context("Failed to initialize logging")?;

    info!(config = ?config, "Starting rask-event-shipper v{}", crate::VERSION);

    let analytics = Analytics::from_config(&config).context("Failed to create batch engine")?;

    let target = cli.command.target();
    let context = target.context();
    let properties = target.properties().context("Invalid property")?;

    match &cli.command {
        Command::Track { event, .. } => analytics
            .track(&context, event, &properties)
            .with_context(|| format!("Failed to record event '{event}'"))?,
        Command::UserSet { .. } => analytics
            .user_set(&context, &properties)
            .context("Failed to record user properties")?,
    }

    analytics.close().await.context("Failed to close engine")?;

    let stats = analytics.engine().stats();
    info!(
        accepted = stats.accepted,
        dropped = stats.dropped,
        attempts = stats.attempts,
        "Shipper finished"
    );

    if stats.dropped > 0 {
        anyhow::bail!("{} record(s) were dropped after exhausting retries", stats.dropped);
    }

    Ok(())
}
