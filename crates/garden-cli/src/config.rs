//! Configuration loading with command-line overrides

use crate::cli::Cli;
use anyhow::{Context, Result};
use garden_config::{ConfigLoader, GardenConfig, HistoryProviderKind};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Load the config file named on the command line (or `./garden.toml`, or
/// defaults) and apply the flag overrides on top.
pub async fn load(cli: &Cli) -> Result<GardenConfig> {
    let mut config = ConfigLoader::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, cli);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

/// Flags win over file values
pub fn apply_overrides(config: &mut GardenConfig, cli: &Cli) {
    if let Some(content) = &cli.content {
        config.content.root = content.clone();
    }
    if let Some(output) = &cli.output {
        config.build.output = output.clone();
    }
    if cli.strict {
        config.build.strict_urls = true;
    }
    if cli.no_history {
        config.enrichment.provider = HistoryProviderKind::None;
    }
    if let Some(parallel) = cli.parallel {
        config.build.parse_workers = parallel;
    }
}

/// Filter for the tracing subscriber.
///
/// `--log-level` / `--verbose` win, then `RUST_LOG`, then the config file.
pub fn log_filter(cli: &Cli, config: &GardenConfig) -> EnvFilter {
    if let Some(level) = cli.requested_level() {
        return EnvFilter::default().add_directive(level.into());
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    EnvFilter::default().add_directive(level.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "garden",
            "build",
            "--content",
            "notes",
            "-o",
            "public",
            "--strict",
            "--no-history",
        ])
        .unwrap();
        let mut config = GardenConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.content.root, PathBuf::from("notes"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.strict_urls);
        assert_eq!(config.enrichment.provider, HistoryProviderKind::None);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let cli = Cli::try_parse_from(["garden", "stats"]).unwrap();
        let mut config = GardenConfig::default();
        config.build.strict_urls = true;
        apply_overrides(&mut config, &cli);

        assert!(config.build.strict_urls);
        assert_eq!(config.enrichment.provider, HistoryProviderKind::Git);
    }

    #[tokio::test]
    async fn test_overrides_are_validated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garden.toml");
        std::fs::write(&path, "[build]\nparse_workers = 2\n").unwrap();

        let path = path.to_str().unwrap();
        let cli = Cli::try_parse_from(["garden", "build", "-C", path]).unwrap();
        assert_eq!(load(&cli).await.unwrap().build.parse_workers, 2);

        let cli = Cli::try_parse_from(["garden", "build", "-C", path, "-j", "0"]).unwrap();
        assert!(load(&cli).await.is_err());
    }
}
