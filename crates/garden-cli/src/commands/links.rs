use crate::cli::OutputFormat;
use crate::output;
use anyhow::Result;
use garden_config::GardenConfig;
use garden_pipeline::analyze_links;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    config: GardenConfig,
    top: usize,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let build = super::build_graph(config, cancel).await?;
    let analysis = analyze_links(&build.graph, top);
    output::emit(format, &analysis, output::link_analysis)
}
