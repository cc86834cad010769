use crate::cli::OutputFormat;
use crate::output;
use anyhow::Result;
use garden_config::GardenConfig;
use garden_pipeline::garden_stats;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    config: GardenConfig,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let build = super::build_graph(config, cancel).await?;
    let stats = garden_stats(&build.graph);
    output::emit(format, &stats, output::garden_stats)
}
