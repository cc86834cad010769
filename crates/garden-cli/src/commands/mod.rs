pub mod all;
pub mod build;
pub mod external;
pub mod links;
pub mod stats;

use anyhow::{Context, Result};
use garden_config::GardenConfig;
use garden_pipeline::{Build, SiteBuilder};
use tokio_util::sync::CancellationToken;

/// Builder for `config` that stops when `cancel` fires
async fn site_builder(config: GardenConfig, cancel: CancellationToken) -> Result<SiteBuilder> {
    let builder = SiteBuilder::from_config(config)
        .await
        .context("Failed to set up the build")?;
    Ok(builder.with_cancellation(cancel))
}

/// Build the graph without rendering it
async fn build_graph(config: GardenConfig, cancel: CancellationToken) -> Result<Build> {
    let builder = site_builder(config, cancel).await?;
    let root = builder.config().content.root.clone();
    builder
        .build()
        .await
        .with_context(|| format!("Failed to build the garden at {}", root.display()))
}
