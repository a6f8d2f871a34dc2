use anyhow::{Context, Result};
use clap::Parser;
use parley_cli::{
    cli::{Cli, Commands},
    commands, logging,
};
use parley_config::AppConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration with CLI overrides
    let config = AppConfig::load(cli.config.clone(), cli.config_overrides())
        .context("Failed to load configuration")?;

    let level = cli.effective_log_level(config.log_level.as_deref());
    logging::init_logging(level.into(), &config.log_path())?;
    debug!(?level, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::execute(config).await,
        Commands::Models => commands::models::execute(config).await,
        Commands::History => commands::history::execute(config).await,
        Commands::Config => commands::config::execute(&config),
    }
}
