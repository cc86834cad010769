use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use garden_cli::{
    cli::{Cli, Commands},
    commands, config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load(&cli).await?;

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter(&cli, &config))
        .with_ansi(config.logging.ansi)
        .with_writer(std::io::stderr)
        .init();
    debug!(root = %config.content.root.display(), "Configuration ready");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling build");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Build => commands::build::execute(config, cli.format, cancel).await?,
        Commands::Links { top } => {
            commands::links::execute(config, top, cli.format, cancel).await?
        }
        Commands::Stats => commands::stats::execute(config, cli.format, cancel).await?,
        Commands::External { check } => {
            commands::external::execute(config, check, cli.format, cancel).await?
        }
        Commands::All { top, check } => {
            commands::all::execute(config, top, check, cli.format, cancel).await?
        }
    }

    Ok(())
}
