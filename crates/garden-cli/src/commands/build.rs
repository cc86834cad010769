use crate::cli::OutputFormat;
use crate::output;
use crate::render::ManifestRenderer;
use anyhow::{Context, Result};
use garden_config::GardenConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub async fn execute(
    config: GardenConfig,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let renderer = ManifestRenderer::new(&config.build.output, &config.build.base_url);
    let builder = super::site_builder(config, cancel).await?;

    let (build, summary) = builder
        .build_and_render(&renderer)
        .await
        .context("Build failed")?;

    if !build.report.diagnostics.is_empty() {
        warn!(
            count = build.report.diagnostics.len(),
            "Some notes were built with problems"
        );
    }

    output::emit(format, &build.report, output::build_report)?;
    if format == OutputFormat::Table {
        println!(
            "\nRendered {} pages to {}",
            summary.rendered,
            renderer.manifest_path().display()
        );
    }
    Ok(())
}
